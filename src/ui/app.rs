use anyhow::Result;
use std::future::Future;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::models::ScanResult;
use crate::screens::camera::{CameraScreen, CaptureOutcome};
use crate::screens::home::HomeScreen;
use crate::screens::inventory::InventoryScreen;
use crate::screens::navigation::{Navigator, Route};
use crate::screens::review::{ReviewScreen, SaveOutcome};
use crate::services::notify::Notice;
use crate::services::state::AppState;
use crate::ui::commands::{self, Command};
use crate::ui::render;

#[derive(Clone)]
enum ActiveScreen {
    Home(Arc<HomeScreen>),
    Camera(Arc<CameraScreen>),
    Review(Arc<ReviewScreen>),
    Inventory(Arc<InventoryScreen>),
}

impl ActiveScreen {
    fn unmount(&self) {
        match self {
            ActiveScreen::Home(screen) => screen.unmount(),
            ActiveScreen::Camera(screen) => screen.unmount(),
            ActiveScreen::Review(screen) => screen.unmount(),
            ActiveScreen::Inventory(screen) => screen.unmount(),
        }
    }
}

/// Navigation requested by a finished operation.
#[derive(Debug)]
enum Next {
    Review(ScanResult),
    Home,
}

/// A screen task finished. `screen` is the mount it was started from.
#[derive(Debug)]
pub struct Done {
    screen: u64,
    next: Option<Next>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Owns the navigator and the one mounted screen. Screen operations run as
/// tasks and report back through [`App::complete`], so input is never blocked.
pub struct App {
    state: AppState,
    nav: Navigator,
    active: ActiveScreen,
    mount_id: u64,
    pending: usize,
    done_tx: mpsc::UnboundedSender<Done>,
    done_rx: mpsc::UnboundedReceiver<Done>,
}

impl App {
    pub fn new(state: AppState) -> Self {
        let (done_tx, done_rx) = mpsc::unbounded_channel();
        let home = Arc::new(HomeScreen::new(&state));
        let mut app = App {
            state,
            nav: Navigator::new(),
            active: ActiveScreen::Home(home.clone()),
            mount_id: 0,
            pending: 0,
            done_tx,
            done_rx,
        };
        app.spawn(async move {
            home.mount().await;
            None
        });
        app
    }

    pub fn route(&self) -> Route {
        self.nav.current()
    }

    pub fn render(&self) -> String {
        match &self.active {
            ActiveScreen::Home(screen) => render::home(screen),
            ActiveScreen::Camera(screen) => render::camera(screen),
            ActiveScreen::Review(screen) => render::review(screen),
            ActiveScreen::Inventory(screen) => render::inventory(screen),
        }
    }

    pub fn handle(&mut self, command: Command) -> Flow {
        match command {
            Command::Quit => {
                self.active.unmount();
                return Flow::Quit;
            }
            Command::Help | Command::Unknown(_) => {}
            Command::Back => {
                if self.nav.back().is_some() {
                    self.remount();
                }
            }
            Command::Home => self.go(Route::Home),
            Command::Scan => self.go(Route::Camera),
            Command::Inventory => self.go(Route::Inventory),
            command => self.dispatch(command),
        }
        Flow::Continue
    }

    /// Wait for the next finished screen task.
    pub async fn next_done(&mut self) -> Option<Done> {
        self.done_rx.recv().await
    }

    /// Apply a finished task. Results from a screen that is no longer mounted
    /// never navigate.
    pub fn complete(&mut self, done: Done) {
        self.pending = self.pending.saturating_sub(1);
        if done.screen != self.mount_id {
            debug!(?done, "Dropping result of a left screen");
            return;
        }
        match done.next {
            Some(Next::Review(scan)) => {
                self.nav.open_review(scan);
                self.remount();
            }
            Some(Next::Home) => self.go(Route::Home),
            None => {}
        }
    }

    fn dispatch(&mut self, command: Command) {
        match (self.active.clone(), command) {
            (ActiveScreen::Home(screen), Command::Refresh) => self.spawn(async move {
                screen.refresh().await;
                None
            }),
            (ActiveScreen::Home(screen), Command::Show(index)) => {
                screen.select(index);
            }
            (ActiveScreen::Camera(screen), Command::GrantPermission) => self.spawn(async move {
                screen.request_permission().await;
                None
            }),
            (ActiveScreen::Camera(screen), Command::Capture(path)) => {
                if let Some(path) = path {
                    screen.preselect(path);
                }
                self.spawn(async move {
                    match screen.capture().await {
                        CaptureOutcome::Forwarded(scan) => Some(Next::Review(scan)),
                        _ => None,
                    }
                });
            }
            (ActiveScreen::Review(screen), Command::Vendor(value)) => screen.set_vendor(value),
            (ActiveScreen::Review(screen), Command::Date(value)) => screen.set_date(value),
            (ActiveScreen::Review(screen), Command::Total(value)) => screen.set_total(value),
            (ActiveScreen::Review(screen), Command::MarkDuplicate) => {
                screen.mark_as_duplicate();
            }
            (ActiveScreen::Review(screen), Command::ContinueAnyway) => {
                screen.continue_anyway();
            }
            (ActiveScreen::Review(screen), Command::Validate) => self.spawn(async move {
                screen.validate().await;
                None
            }),
            (ActiveScreen::Review(screen), Command::Save) => self.spawn(async move {
                match screen.save().await {
                    SaveOutcome::Saved(_) => Some(Next::Home),
                    _ => None,
                }
            }),
            (ActiveScreen::Inventory(screen), Command::Filter(query)) => screen.set_query(query),
            (ActiveScreen::Inventory(screen), Command::Search(query)) => {
                if let Some(query) = query {
                    screen.set_query(query);
                }
                self.spawn(async move {
                    screen.submit().await;
                    None
                });
            }
            (ActiveScreen::Inventory(screen), Command::Refresh) => self.spawn(async move {
                screen.refresh().await;
                None
            }),
            (_, command) => debug!(?command, "Command not available on this screen"),
        }
    }

    fn spawn<F>(&mut self, work: F)
    where
        F: Future<Output = Option<Next>> + Send + 'static,
    {
        let tx = self.done_tx.clone();
        let screen = self.mount_id;
        self.pending += 1;
        tokio::spawn(async move {
            let next = work.await;
            let _ = tx.send(Done { screen, next });
        });
    }

    fn go(&mut self, route: Route) {
        if route == self.nav.current() || !self.nav.navigate(route) {
            return;
        }
        self.remount();
    }

    /// Swap the mounted screen for the navigator's current route.
    fn remount(&mut self) {
        self.active.unmount();
        self.mount_id += 1;
        if self.nav.current() == Route::Review {
            match self.nav.take_scan() {
                Some(scan) => {
                    self.active = ActiveScreen::Review(Arc::new(ReviewScreen::new(scan, &self.state)));
                    return;
                }
                None => {
                    self.nav.navigate(Route::Home);
                }
            }
        }

        let route = self.nav.current();
        debug!(?route, "Mounting screen");
        match route {
            Route::Camera => {
                let screen = Arc::new(CameraScreen::new(&self.state));
                self.active = ActiveScreen::Camera(screen.clone());
                self.spawn(async move {
                    screen.mount().await;
                    None
                });
            }
            Route::Inventory => {
                let screen = Arc::new(InventoryScreen::new(&self.state));
                self.active = ActiveScreen::Inventory(screen.clone());
                self.spawn(async move {
                    screen.mount().await;
                    None
                });
            }
            Route::Home | Route::Review => {
                let screen = Arc::new(HomeScreen::new(&self.state));
                self.active = ActiveScreen::Home(screen.clone());
                self.spawn(async move {
                    screen.mount().await;
                    None
                });
            }
        }
    }
}

enum Event {
    Line(Option<String>),
    Done(Done),
}

fn print_notices(rx: &mut mpsc::UnboundedReceiver<Notice>) {
    while let Ok(notice) = rx.try_recv() {
        println!("{}", render::notice(&notice));
    }
}

/// Line-oriented loop over stdin until `quit` or end of input. Screen
/// operations finish in the background and redraw when they land.
pub async fn run(state: AppState, mut notices: mpsc::UnboundedReceiver<Notice>) -> Result<()> {
    let mut app = App::new(state);
    println!("{}", app.render());
    println!("{}", commands::help(app.route()));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let event = tokio::select! {
            line = lines.next_line() => Event::Line(line?),
            Some(done) = app.next_done() => Event::Done(done),
        };

        let mut show_help = false;
        match event {
            Event::Line(None) => {
                app.handle(Command::Quit);
                break;
            }
            Event::Line(Some(line)) => {
                let Some(command) = commands::parse(app.route(), &line) else {
                    continue;
                };
                if let Command::Unknown(text) = &command {
                    println!("Unknown command: {}", text);
                }
                show_help = command == Command::Help;
                if app.handle(command) == Flow::Quit {
                    break;
                }
            }
            Event::Done(done) => app.complete(done),
        }

        print_notices(&mut notices);
        println!("{}", app.render());
        if show_help {
            println!("{}", commands::help(app.route()));
        }
    }
    info!("Bye");
    Ok(())
}
