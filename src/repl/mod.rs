//! Line-based REPL with rustyline
//!
//! Every line is evaluated as one cell through the session; lines starting
//! with `:` are REPL commands.

use std::fs;
use std::path::PathBuf;

use owo_colors::OwoColorize;
use rustyline::config::Config;
use rustyline::error::ReadlineError;
use rustyline::history::FileHistory;
use rustyline::{Editor, EditMode};

use crate::runtime::{LoadOutcome, Session};
use crate::store::ResultObject;
use crate::store::mime::MIME_TYPE_TEXT;
use crate::util::config::ReplConfig;

const HELP: &str = "\
:help            show this help
:quit            leave the REPL
:load FILE       load a Lua file as a named fragment (once)
:fragments       list loaded fragments
:info            show kernel information";

/// What a `:` command asks the loop to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    Quit,
    Load(PathBuf),
    Fragments,
    Info,
    Unknown(String),
}

impl Command {
    /// Parse a `:` command line. `None` for ordinary code.
    pub fn parse(line: &str) -> Option<Self> {
        let rest = line.trim().strip_prefix(':')?;
        let (name, arg) = match rest.split_once(char::is_whitespace) {
            Some((name, arg)) => (name, arg.trim()),
            None => (rest, ""),
        };
        Some(match name {
            "help" | "h" => Command::Help,
            "quit" | "q" | "exit" => Command::Quit,
            "load" if !arg.is_empty() => Command::Load(PathBuf::from(arg)),
            "fragments" => Command::Fragments,
            "info" => Command::Info,
            _ => Command::Unknown(rest.to_string()),
        })
    }
}

/// Text shown for a result object: the evaluation error, `text/plain`, or
/// the list of MIME types it carries. `None` for an empty result.
pub fn render_result(result: &ResultObject) -> Option<Result<String, String>> {
    if result.is_error() {
        let message = result.data_text("evalue").unwrap_or("unknown error");
        return Some(Err(message.to_string()));
    }
    if let Some(text) = result.data_text(MIME_TYPE_TEXT) {
        return Some(Ok(text.to_string()));
    }
    if result.data.is_empty() {
        return None;
    }
    let kinds: Vec<&str> = result.data.keys().map(String::as_str).collect();
    Some(Ok(format!("<{}>", kinds.join(", "))))
}

/// Line REPL over the global session
pub struct LineRepl {
    config: ReplConfig,
    editor: Editor<(), FileHistory>,
    session: &'static Session,
    counter: usize,
}

impl LineRepl {
    pub fn new(
        session: &'static Session,
        config: ReplConfig,
    ) -> Result<Self, ReadlineError> {
        let rl_config = Config::builder()
            .history_ignore_space(true)
            .max_history_size(config.history_size)?
            .edit_mode(EditMode::Emacs)
            .build();

        let mut editor = Editor::with_config(rl_config)?;

        // Load history if file exists
        if let Some(ref history_file) = config.history_file {
            if history_file.exists() {
                let _ = editor.load_history(history_file);
            }
        }

        Ok(Self {
            config,
            editor,
            session,
            counter: 0,
        })
    }

    /// Run until `:quit` or Ctrl-D.
    pub fn run(&mut self) -> Result<(), ReadlineError> {
        println!("{}", self.session.kernel_info().banner);
        println!("Type :help for assistance, Ctrl+D or :quit to exit\n");

        loop {
            match self.editor.readline(&self.config.prompt) {
                Ok(line) => {
                    if line.trim().is_empty() {
                        continue;
                    }
                    let _ = self.editor.add_history_entry(line.as_str());

                    match Command::parse(&line) {
                        Some(Command::Quit) => break,
                        Some(command) => self.handle(command),
                        None => self.eval(&line),
                    }
                }
                Err(ReadlineError::Eof) => break,
                Err(ReadlineError::Interrupted) => {
                    println!("(Interrupted)");
                    continue;
                }
                Err(e) => return Err(e),
            }
        }

        // Save history
        if let Some(ref history_file) = self.config.history_file {
            let _ = self.editor.save_history(history_file);
        }

        Ok(())
    }

    fn eval(
        &mut self,
        line: &str,
    ) {
        self.counter += 1;
        let name = format!("repl-{}", self.counter);
        let rendered = self
            .session
            .eval_string(&name, line)
            .map_err(|e| e.to_string())
            .and_then(|id| self.session.result(id).ok_or_else(|| format!("{} not found", id)))
            .map(|result| render_result(&result));

        match rendered {
            Ok(Some(Ok(text))) => println!("{}", text),
            Ok(Some(Err(message))) | Err(message) => {
                println!("{} {}", "Error:".red().bold(), message)
            }
            Ok(None) => {}
        }
    }

    fn handle(
        &mut self,
        command: Command,
    ) {
        match command {
            Command::Help | Command::Quit => println!("{}", HELP),
            Command::Fragments => {
                for name in self.session.loaded_fragments() {
                    println!("  {}", name);
                }
            }
            Command::Info => match serde_json::to_string_pretty(&self.session.kernel_info()) {
                Ok(json) => println!("{}", json),
                Err(e) => println!("{} {}", "Error:".red().bold(), e),
            },
            Command::Load(path) => {
                let outcome = fs::read(&path)
                    .map_err(|e| e.to_string())
                    .and_then(|source| {
                        self.session
                            .load_code(&path.display().to_string(), source)
                            .map_err(|e| e.to_string())
                    });
                match outcome {
                    Ok(LoadOutcome::Loaded(_)) => println!("loaded {}", path.display()),
                    Ok(LoadOutcome::AlreadyLoaded) => {
                        println!("{} already loaded", path.display().dimmed())
                    }
                    Ok(LoadOutcome::Failed(message)) | Err(message) => {
                        println!("{} {}", "Error:".red().bold(), message)
                    }
                }
            }
            Command::Unknown(name) => {
                println!("{} unknown command `:{}`", "Error:".red().bold(), name)
            }
        }
    }
}

impl std::fmt::Debug for LineRepl {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("LineRepl")
            .field("config", &self.config)
            .field("counter", &self.counter)
            .finish()
    }
}
