use std::path::PathBuf;

use crate::screens::navigation::Route;

/// One typed line, interpreted for the screen it was typed on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    Quit,
    Back,
    Home,
    Refresh,
    // home
    Scan,
    Inventory,
    Show(usize),
    // camera
    Capture(Option<PathBuf>),
    GrantPermission,
    // review
    Vendor(String),
    Date(String),
    Total(String),
    Validate,
    Save,
    MarkDuplicate,
    ContinueAnyway,
    // inventory
    Filter(String),
    Search(Option<String>),
    Unknown(String),
}

pub fn parse(route: Route, line: &str) -> Option<Command> {
    let line = line.trim_end_matches(['\r', '\n']);
    if line.trim().is_empty() {
        return None;
    }
    let trimmed = line.trim_start();
    let (word, rest) = match trimmed.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest),
        None => (trimmed, ""),
    };
    let word = word.to_ascii_lowercase();

    let command = match word.as_str() {
        "help" | "?" => Command::Help,
        "quit" | "exit" | "q" => Command::Quit,
        "back" | "b" => Command::Back,
        "home" => Command::Home,
        "refresh" | "r" => Command::Refresh,
        _ => match route {
            Route::Home => parse_home(&word),
            Route::Camera => parse_camera(&word, rest),
            Route::Review => parse_review(&word, rest),
            Route::Inventory => parse_inventory(&word, rest),
        },
    };
    Some(match command {
        Command::Unknown(_) => Command::Unknown(trimmed.trim_end().to_string()),
        other => other,
    })
}

fn parse_home(word: &str) -> Command {
    match word {
        "scan" | "s" => Command::Scan,
        "inventory" | "i" => Command::Inventory,
        n => match n.parse::<usize>() {
            Ok(index) if index > 0 => Command::Show(index - 1),
            _ => Command::Unknown(String::new()),
        },
    }
}

fn parse_camera(word: &str, rest: &str) -> Command {
    match word {
        "capture" | "c" => {
            let path = rest.trim();
            Command::Capture((!path.is_empty()).then(|| PathBuf::from(path)))
        }
        "permission" | "grant" => Command::GrantPermission,
        _ => Command::Unknown(String::new()),
    }
}

fn parse_review(word: &str, rest: &str) -> Command {
    match word {
        "vendor" => Command::Vendor(rest.to_string()),
        "date" => Command::Date(rest.to_string()),
        "total" => Command::Total(rest.to_string()),
        "validate" | "v" => Command::Validate,
        "save" => Command::Save,
        "duplicate" | "mark" => Command::MarkDuplicate,
        "continue" => Command::ContinueAnyway,
        _ => Command::Unknown(String::new()),
    }
}

fn parse_inventory(word: &str, rest: &str) -> Command {
    match word {
        "filter" | "/" => Command::Filter(rest.to_string()),
        "clear" => Command::Filter(String::new()),
        "search" => {
            let query = rest.trim();
            Command::Search((!query.is_empty()).then(|| query.to_string()))
        }
        _ => Command::Unknown(String::new()),
    }
}

pub fn help(route: Route) -> &'static str {
    match route {
        Route::Home => "scan | inventory | <n> show invoice n | refresh | quit",
        Route::Camera => "capture [path] | permission | back | quit",
        Route::Review => {
            "vendor <v> | date <d> | total <t> | validate | save | duplicate | continue | back | quit"
        }
        Route::Inventory => "filter <text> | clear | search [text] | refresh | back | quit",
    }
}
