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

use std::fs;
use std::fs::OpenOptions;
use std::io::{Read, Write};
use std::path::Path;
use std::process;

// open a file per the normal rust way, but map any errors to strings
pub fn open_local_file(path: &Path) -> Result<fs::File, String> {
    return fs::File::open(path).map_err(
        |x| format!("unable to open file: {}, {}", path.display(), x)
    );
}

pub fn read_local_file(path: &Path) -> Result<String, String> {
    let mut file = open_local_file(path)?;
    let mut buffer = String::new();
    match file.read_to_string(&mut buffer) {
        Ok(_) => {},
        Err(x) => {
            return Err(format!("unable to read file: {}, {}", path.display(), x));
        }
    };
    return Ok(buffer);
}

// create any missing parent directories of a file about to be written
pub fn ensure_parent_dir(path: &Path) -> Result<(), String> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            fs::create_dir_all(parent).map_err(
                |x| format!("unable to create directory: {}, {}", parent.display(), x)
            )
        },
        _ => Ok(()),
    }
}

// truncate-and-write, the whole file is regenerated on every run
pub fn write_local_file(path: &Path, contents: &str) -> Result<(), String> {
    ensure_parent_dir(path)?;
    return fs::write(path, contents).map_err(
        |x| format!("unable to write file: {}, {}", path.display(), x)
    );
}

// like write_local_file but refuses to replace a file that is already there
pub fn write_new_local_file(path: &Path, contents: &str) -> Result<(), String> {
    ensure_parent_dir(path)?;
    let mut file = OpenOptions::new().write(true).create_new(true).open(path).map_err(
        |x| format!("unable to create file: {}, {}", path.display(), x)
    )?;
    return file.write_all(contents.as_bytes()).map_err(
        |x| format!("unable to write file: {}, {}", path.display(), x)
    );
}

// local time, used to keep generated and backup file names unique per run
pub fn file_timestamp() -> String {
    return chrono::Local::now().format("%Y%m%d_%H%M%S").to_string();
}

pub fn quit(s: &String) {
    // quit with a message - don't use this except in main.rs!
    eprintln!("{}", s);
    process::exit(0x01)
}
