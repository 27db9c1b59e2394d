// Jetporch
// Copyright (C) 2023 - Michael DeHaan <michael@michaeldehaan.net> + contributors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// at your option) any later version.
// 
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
// 
// You should have received a copy of the GNU General Public License
// long with this program.  If not, see <http://www.gnu.org/licenses/>.

use std::path::Path;
use std::sync::Arc;
use inline_colorization::{color_red, color_green, color_yellow, color_reset};

/// Trait for handling output from generator operations
pub trait OutputHandler: Send + Sync {
    fn on_command_start(&self, command: &str);
    fn on_command_end(&self, command: &str, success: bool);

    fn on_file_written(&self, path: &Path);

    // Formatting and template check events
    fn on_file_fixed(&self, _path: &Path, _changed: bool) {}
    fn on_file_unchanged(&self, _path: &Path) {}
    fn on_template_error(&self, _message: &str) {}
    fn on_check_passed(&self, _message: &str) {}

    fn log(&self, level: LogLevel, message: &str);
    fn debug(&self, message: &str) {
        self.log(LogLevel::Debug, message);
    }
    fn info(&self, message: &str) {
        self.log(LogLevel::Info, message);
    }
    fn warning(&self, message: &str) {
        self.log(LogLevel::Warning, message);
    }
    fn error(&self, message: &str) {
        self.log(LogLevel::Error, message);
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
}

/// A no-op output handler for when output is not needed
pub struct NullOutputHandler;

impl OutputHandler for NullOutputHandler {
    fn on_command_start(&self, _command: &str) {}
    fn on_command_end(&self, _command: &str, _success: bool) {}
    fn on_file_written(&self, _path: &Path) {}
    fn log(&self, _level: LogLevel, _message: &str) {}
}

/// Standard terminal output handler
pub struct TerminalOutputHandler {
    pub verbosity: u32,
}

impl TerminalOutputHandler {
    pub fn new(verbosity: u32) -> Self {
        Self { verbosity }
    }
}

impl OutputHandler for TerminalOutputHandler {
    fn on_command_start(&self, command: &str) {
        if self.verbosity > 0 {
            crate::util::terminal::banner(&format!("COMMAND: {}", command));
        }
    }

    fn on_command_end(&self, command: &str, success: bool) {
        if !success {
            eprintln!("{color_red}{} FAILED{color_reset}", command);
        }
    }

    fn on_file_written(&self, path: &Path) {
        println!("{color_green}WROTE{color_reset} => {}", path.display());
    }

    fn on_file_fixed(&self, path: &Path, changed: bool) {
        if changed {
            println!("{color_yellow}FIXED{color_reset} => {}", path.display());
        } else {
            println!("{color_green}OK{color_reset} => {}", path.display());
        }
    }

    fn on_file_unchanged(&self, path: &Path) {
        if self.verbosity > 0 {
            println!("{color_green}OK{color_reset} => {}", path.display());
        }
    }

    fn on_template_error(&self, message: &str) {
        println!("{color_red}{}{color_reset}", message);
    }

    fn on_check_passed(&self, message: &str) {
        println!("{color_green}{}{color_reset}", message);
    }

    fn log(&self, level: LogLevel, message: &str) {
        match level {
            LogLevel::Debug if self.verbosity >= 3 => println!("DEBUG: {}", message),
            LogLevel::Info if self.verbosity >= 1 => println!("INFO: {}", message),
            LogLevel::Warning => println!("{color_yellow}WARNING{color_reset}: {}", message),
            LogLevel::Error => eprintln!("{color_red}ERROR{color_reset}: {}", message),
            _ => {}
        }
    }
}

/// Thread-safe wrapper for output handlers
pub type OutputHandlerRef = Arc<dyn OutputHandler>;
