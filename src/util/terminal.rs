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

pub fn markdown_print(markdown: &str) {
    termimad::print_text(markdown);
}

pub fn banner(msg: &str) {
    markdown_print(&format!("|:-|\n|{}|\n|-", escape_cell(msg)));
}

// render rows as a markdown table, the header row first
pub fn two_column_table(header_a: &str, header_b: &str, elements: &[(String, String)]) {
    markdown_print(&two_column_markdown(header_a, header_b, elements));
}

fn two_column_markdown(header_a: &str, header_b: &str, elements: &[(String, String)]) -> String {
    let mut buffer = format!("|:-|:-\n|{}|{}\n", escape_cell(header_a), escape_cell(header_b));
    for (a, b) in elements {
        buffer.push_str("|-|-\n");
        buffer.push_str(&format!("|{}|{}\n", escape_cell(a), escape_cell(b)));
    }
    buffer.push_str("|-|-\n");
    buffer
}

// pipes would split a termimad cell in two
fn escape_cell(cell: &str) -> String {
    cell.replace('|', "\\|")
}
