//! Indentation-tracking writer for the generated Go source.
//!
//! Go source is tab-indented, so the writer always indents with `\t`.
//! Indentation is managed through an RAII guard (`Rc<Cell<usize>>`
//! internally, so guards never fight the borrow checker over the writer),
//! plus a `block` helper for the `header { ... }` shape that makes up most
//! of the output.

use std::cell::Cell;
use std::rc::Rc;

pub struct CodeWriter {
    out: String,
    indent_level: Rc<Cell<usize>>,
    at_line_start: bool,
}

impl CodeWriter {
    pub fn new() -> Self {
        Self {
            out: String::new(),
            indent_level: Rc::new(Cell::new(0)),
            at_line_start: true,
        }
    }

    /// Write text without a newline, indenting first if at line start.
    pub fn write(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        if self.at_line_start {
            for _ in 0..self.indent_level.get() {
                self.out.push('\t');
            }
            self.at_line_start = false;
        }
        self.out.push_str(text);
    }

    /// Write one full line.
    pub fn writeln(&mut self, text: &str) {
        self.write(text);
        self.out.push('\n');
        self.at_line_start = true;
    }

    /// Write an empty line (never indented).
    pub fn blank_line(&mut self) {
        self.out.push('\n');
        self.at_line_start = true;
    }

    /// Increase indentation for as long as the returned guard lives.
    pub fn indent(&mut self) -> IndentGuard {
        self.indent_level.set(self.indent_level.get() + 1);
        IndentGuard {
            indent_level: Rc::clone(&self.indent_level),
        }
    }

    /// Write `header {`, run `body` one level deeper, then write `}`.
    pub fn block<F>(&mut self, header: &str, body: F)
    where
        F: FnOnce(&mut Self),
    {
        self.writeln(&format!("{} {{", header));
        {
            let _indent = self.indent();
            body(self);
        }
        self.writeln("}");
    }

    pub fn finish(self) -> String {
        self.out
    }
}

impl Default for CodeWriter {
    fn default() -> Self {
        Self::new()
    }
}

/// RAII guard that restores the previous indentation level on drop.
pub struct IndentGuard {
    indent_level: Rc<Cell<usize>>,
}

impl Drop for IndentGuard {
    fn drop(&mut self) {
        let current = self.indent_level.get();
        self.indent_level.set(current.saturating_sub(1));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_tab_indented_lines() {
        let mut w = CodeWriter::new();
        w.writeln("level 0");
        {
            let _indent = w.indent();
            w.writeln("level 1");
            {
                let _indent = w.indent();
                w.writeln("level 2");
            }
            w.writeln("level 1 again");
        }
        w.writeln("level 0 again");

        assert_eq!(
            w.finish(),
            "level 0\n\tlevel 1\n\t\tlevel 2\n\tlevel 1 again\nlevel 0 again\n"
        );
    }

    #[test]
    fn block_brackets_the_body() {
        let mut w = CodeWriter::new();
        w.block("func main()", |w| {
            w.writeln("run()");
            w.block("if err != nil", |w| w.writeln("return err"));
        });

        assert_eq!(
            w.finish(),
            "func main() {\n\trun()\n\tif err != nil {\n\t\treturn err\n\t}\n}\n"
        );
    }

    #[test]
    fn blank_lines_are_never_indented() {
        let mut w = CodeWriter::new();
        let _indent = w.indent();
        w.writeln("a");
        w.blank_line();
        w.writeln("b");
        drop(_indent);

        assert_eq!(w.finish(), "\ta\n\n\tb\n");
    }

    #[test]
    fn partial_writes_share_one_indent() {
        let mut w = CodeWriter::new();
        let _indent = w.indent();
        w.write("return ");
        w.write("out, ");
        w.writeln("nil");
        drop(_indent);

        assert_eq!(w.finish(), "\treturn out, nil\n");
    }
}
