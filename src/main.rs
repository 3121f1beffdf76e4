// src/main.rs
//
// Text-mode driver for the rules engine. Everything here is presentation:
// the engine decides legality and outcomes, this loop owns turn toggling and
// game-over flagging. Per player action the sequence is fixed: validate,
// execute, check the opponent for check, then checkmate, then toggle the
// turn unless the game ended.

use chess_core::{is_checkmate, is_in_check, is_legal, Color, Coord, Game, Move};
use lazy_static::lazy_static;
use regex::Regex;
use std::error::Error;
use std::fmt;
use std::io::{self, Write};

const DEFAULT_RECORD_FILENAME: &str = "chess_record.json";

lazy_static! {
    // "e2e4", "e2 e4", "e2-e4"
    static ref MOVE_RE: Regex = Regex::new(r"^([a-h][1-8])[-\s]*([a-h][1-8])$").unwrap();
}

// --- Input Parsing ---

#[derive(Debug)]
enum UserInput {
    Move(Move),
    Command(Command),
}

#[derive(Debug)]
enum Command {
    Undo,
    NewGame,
    History,
    Help,
    Quit,
    SaveRecord(String),
}

#[derive(Debug)]
enum CommandError {
    UnknownInput(String),
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandError::UnknownInput(s) => {
                write!(f, "Unrecognized input: '{}'. Enter a move like 'e2e4' or type 'help'.", s)
            }
        }
    }
}

impl Error for CommandError {}

fn parse_user_input(input: &str) -> Result<UserInput, CommandError> {
    let trimmed = input.trim();
    let lower = trimmed.to_lowercase();

    let mut parts = trimmed.splitn(2, char::is_whitespace);
    let command_word = parts.next().unwrap_or("").to_lowercase();
    let argument = parts.next().unwrap_or("").trim();

    match command_word.as_str() {
        "undo" => return Ok(UserInput::Command(Command::Undo)),
        "new" | "restart" => return Ok(UserInput::Command(Command::NewGame)),
        "history" => return Ok(UserInput::Command(Command::History)),
        "help" | "?" => return Ok(UserInput::Command(Command::Help)),
        "quit" | "exit" => return Ok(UserInput::Command(Command::Quit)),
        "save" => {
            let filename = if argument.is_empty() { DEFAULT_RECORD_FILENAME } else { argument };
            return Ok(UserInput::Command(Command::SaveRecord(filename.to_string())));
        }
        _ => {}
    }

    if let Some(caps) = MOVE_RE.captures(&lower) {
        // The regex only admits valid squares, so both parses succeed.
        let from = Coord::from_algebraic(&caps[1]);
        let to = Coord::from_algebraic(&caps[2]);
        if let (Some(from), Some(to)) = (from, to) {
            return Ok(UserInput::Move(Move::new(from, to)));
        }
    }

    Err(CommandError::UnknownInput(trimmed.to_string()))
}

// --- Move Orchestration ---

/// Runs one player action through the engine. Returns the winner if the game
/// ended on this move.
fn play_move(game: &mut Game, mv: Move) -> Option<Color> {
    let mover = game.board().turn;

    // Pick-up and drop filters, mirroring what a board UI enforces before it
    // ever consults the engine.
    let piece = match game.board().piece_at(mv.from) {
        Some(p) => p,
        None => {
            println!("No piece at {}.", mv.from);
            return None;
        }
    };
    if piece.color != mover {
        println!("The piece at {} is not yours to move.", mv.from);
        return None;
    }
    if let Some(target) = game.board().piece_at(mv.to) {
        if target.color == mover {
            println!("Cannot move to {}: that square holds your own piece.", mv.to);
            return None;
        }
    }

    if !is_legal(game.board(), mv.from, mv.to) {
        println!("Illegal move: {}.", mv);
        return None;
    }

    let outcome = game.apply_move(mv);
    if let Some(captured) = outcome.captured {
        println!("{:?} captures {} on {}.", mover, captured, mv.to);
    }
    if let Some(winner) = outcome.winner {
        println!("\n=== GAME OVER: {:?} wins by capturing the king. ===", winner);
        return Some(winner);
    }

    let opponent = mover.opponent();
    if is_in_check(game.board(), opponent) {
        if is_checkmate(game.board(), opponent) {
            println!("\n=== GAME OVER: Checkmate! {:?} wins. ===", mover);
            return Some(mover);
        }
        println!("{:?} is in check!", opponent);
    }
    // Self-check is legal but worth flagging to the player.
    if is_in_check(game.board(), mover) {
        println!("Warning: your own king is in check.");
    }

    game.board_mut().toggle_turn();
    None
}

fn print_history(game: &Game) {
    if game.history().is_empty() {
        println!("No moves played yet.");
        return;
    }
    for (i, mv) in game.history().iter().enumerate() {
        println!("{:>3}. {}", i + 1, mv);
    }
}

// --- Main Game Loop ---

fn main() -> Result<(), Box<dyn Error>> {
    let mut game = Game::new();
    let mut winner: Option<Color> = None;

    println!("==============================");
    println!("|        Chess Core          |");
    println!("==============================");
    print_help();

    'game_loop: loop {
        if let Some(color) = winner {
            println!("------------------------------------------");
            println!("{}", game.board());
            println!("Saving game record to '{}'...", DEFAULT_RECORD_FILENAME);
            if let Err(e) = game.save_record(DEFAULT_RECORD_FILENAME, Some(color)) {
                eprintln!("Error: failed to save game record: {}", e);
            }
            break 'game_loop;
        }

        println!("------------------------------------------");
        println!("{}", game.board());
        print!("\n{:?} to move. Enter move (e.g. e2e4) or command: ", game.board().turn);
        io::stdout().flush()?;

        let mut input_line = String::new();
        match io::stdin().read_line(&mut input_line) {
            Ok(0) => {
                println!("\nEnd of input detected. Quitting game.");
                break 'game_loop;
            }
            Ok(_) => {}
            Err(e) => {
                eprintln!("Error reading input: {}. Try again or use 'quit'.", e);
                continue 'game_loop;
            }
        }

        let input_trimmed = input_line.trim();
        if input_trimmed.is_empty() {
            continue 'game_loop;
        }

        match parse_user_input(input_trimmed) {
            Ok(UserInput::Move(mv)) => {
                winner = play_move(&mut game, mv);
            }
            Ok(UserInput::Command(command)) => match command {
                Command::Undo => {
                    if game.undo() {
                        println!("Last move undone. Note: a captured piece is not brought back.");
                    } else {
                        println!("Nothing to undo.");
                    }
                }
                Command::NewGame => {
                    game.reset();
                    winner = None;
                    println!("New game started. White to move.");
                }
                Command::History => print_history(&game),
                Command::Help => print_help(),
                Command::Quit => {
                    println!("Exiting game.");
                    break 'game_loop;
                }
                Command::SaveRecord(filename) => match game.save_record(&filename, winner) {
                    Ok(()) => println!("Game record saved to '{}'.", filename),
                    Err(e) => println!("Error saving game record: {}", e),
                },
            },
            Err(e) => {
                println!("Input Error: {}", e);
            }
        }
    }

    println!("\nGame session finished.");
    Ok(())
}

/// Prints available commands.
fn print_help() {
    println!("\nAvailable Commands:");
    println!("  <move>       Enter a move as from-square then to-square (e.g. e2e4, e2 e4).");
    println!("  undo         Take back the last move (captured pieces are not restored).");
    println!("  new          Restart with the opening position.");
    println!("  history      Show the moves played so far.");
    println!("  save [file]  Save the game record as JSON (default: {}).", DEFAULT_RECORD_FILENAME);
    println!("  help         Show this help message.");
    println!("  quit / exit  Leave the game.");
    println!();
}
