mod app;
mod game;
mod snake;
mod spawn;
mod term;

/// Coordinate in terminal space, as crossterm understands it.
pub type TermInt = u16;

/// Coordinate in board space. Signed so that next-head arithmetic can
/// never underflow, even at the border.
pub type Coord = i32;
pub type Cell = (Coord, Coord);

fn main() {
    let mut app = app::App::new();
    app.initialize();
    app.show_intro();

    loop {
        // The round loop takes care of exiting cleanly on CTRL+C
        app.play();
    }
}
