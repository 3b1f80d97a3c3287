use orrery::config;
use orrery::gui::app::AppModel;
use orrery::gui::ring::State;
use orrery::sys::runtime;
use relm4::prelude::*;

fn main() {
    env_logger::init();

    let config = config::load_or_setup();
    let state = State::from_config(&config);
    let owner_source = config.owner_avatar.clone();

    let (tx, rx) = async_channel::bounded(32);
    let (fetch_tx, fetch_rx) = async_channel::unbounded();

    // Start Background Services
    runtime::start_background_services(tx, fetch_rx);

    let app = RelmApp::new("org.troia.orrery");

    app.run::<AppModel>((state, owner_source, rx, fetch_tx));
}
