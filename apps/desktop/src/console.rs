use client_core::{
    channel::Channel, render::render_surface, visualizer::EffectScheduler, SyncEngine,
};

/// Prints whatever changed in the engine since the last refresh.
#[derive(Debug, Default)]
pub struct Console {
    seen_entries: usize,
    seen_alerts: usize,
    status: String,
    revision: Option<u64>,
}

impl Console {
    pub fn refresh<C: Channel, S: EffectScheduler>(&mut self, engine: &SyncEngine<C, S>) {
        for entry in engine.log().since(self.seen_entries) {
            println!("{entry}");
        }
        self.seen_entries = engine.log().len();

        for alert in engine.alerts().iter().skip(self.seen_alerts) {
            println!("!! {alert}");
        }
        self.seen_alerts = engine.alerts().len();

        if engine.status() != self.status {
            self.status = engine.status().to_string();
            println!("-- {}", self.status);
        }

        let revision = engine.surface().revision();
        if self.revision != Some(revision) {
            self.revision = Some(revision);
            let software = engine
                .registration()
                .map(|registration| registration.display_name().to_string())
                .unwrap_or_else(|| "unregistered".to_string());
            let view = engine.current_view().unwrap_or("-");
            println!("== {software} | view: {view} ==");
            print!("{}", render_surface(engine.surface()));
        }
    }
}
