//! TutorTalk Launcher - GUI Application
//!
//! Run with: cargo run --bin tutortalk-launcher

use iced::application;
use tutortalk::config::Config;
use tutortalk::gui::TutorApp;
use tutortalk::session::SessionController;

fn main() -> anyhow::Result<()> {
    let mut config = Config::load().unwrap_or_default();
    config.apply_env();
    tutortalk::logging::init(false, &config.log_level);

    // Replies are spoken on a runtime of our own; iced drives its own executor
    let speech_runtime = tokio::runtime::Runtime::new()?;
    let controller = SessionController::from_config(&config, speech_runtime.handle().clone())?;
    let history_limit = config.history_display_limit;

    application(TutorApp::title, TutorApp::update, TutorApp::view)
        .theme(TutorApp::theme)
        .subscription(TutorApp::subscription)
        .run_with(move || TutorApp::new(controller, history_limit))?;

    Ok(())
}
