mod app;
mod calculation;
mod cli;
mod config;
mod display;
mod error;
mod io;
mod logging;
mod prelude;
mod router;

use jiff::Zoned;

use app::App;
use cli::Cli;
use prelude::*;

fn main() -> AppResult {
    let cli = Cli::new();

    logging::init(cli.verbose);

    // "Today" is the user's day, not UTC's. It decides which days exist yet.
    let today = Zoned::now().date();

    let app = App::new(cli, today);
    let source = app.source()?;

    let report = router::does_the_thing(&app, &source)?;

    // Tables turn into CSV, JSON stays as it was rendered.
    let output_message = report.render(app.cli.unformatted)?;

    app.display.stop_with_message(&output_message);

    Ok(())
}
