mod application;
mod presentation;

use fsrecorder_core::error::Result;

fn main() -> Result<()> {
    env_logger::init();
    application::run()
}
