/// Line buffer with two-space indentation for nested text format blocks.
pub struct TextFormatter {
    buffer: String,
    indentation: usize,
}

impl TextFormatter {
    /// An empty buffer at indentation level zero.
    pub fn new() -> Self {
        Self {
            buffer: String::new(),
            indentation: 0,
        }
    }
    
    /// Indent all following lines one level deeper.
    pub fn indent(&mut self) {
        self.indentation += 2;
    }
    
    /// Go back one level. Does nothing at level zero.
    pub fn unindent(&mut self) {
        if self.indentation > 0 {
            self.indentation -= 2;
        }
    }
    
    /// Append `line` at the current indentation, followed by a newline.
    pub fn write<S: AsRef<str>>(&mut self, line: S) {
        for _ in 0..self.indentation {
            self.buffer.push(' ');
        }
        
        self.buffer.push_str(line.as_ref());
        self.buffer.push('\n');
    }
    
    /// Consume the formatter and return the text.
    pub fn finish(self) -> String {
        self.buffer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    
    #[test]
    fn test_formatter() {
        let mut fmt = TextFormatter::new();
        fmt.write("inner {");
        fmt.indent();
        fmt.write("flag: 1");
        fmt.unindent();
        fmt.unindent();
        fmt.write("}");
        assert_eq!(fmt.finish(), "inner {\n  flag: 1\n}\n");
    }
}
