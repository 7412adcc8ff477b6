//! Helpers for descriptors, generic signatures and class names.
//!
//! Parsing here is lenient: these helpers feed the linker, which resolves whatever
//! class names it can find and leaves the rest unresolved. Malformed input yields the
//! names recognised up to the point of failure rather than an error.

/// Returns the internal class names mentioned in a field or method descriptor, in order.
///
/// # Examples
///
/// ```rust
/// use classhrink::model::descriptor::descriptor_class_names;
///
/// let names = descriptor_class_names("(ILjava/lang/String;[Lcom/example/Foo;)V");
/// assert_eq!(names, vec!["java/lang/String", "com/example/Foo"]);
/// ```
#[must_use]
pub fn descriptor_class_names(descriptor: &str) -> Vec<&str> {
    let mut names = Vec::new();
    let mut rest = descriptor;
    while let Some(start) = rest.find('L') {
        let tail = &rest[start + 1..];
        let Some(end) = tail.find(';') else {
            break;
        };
        names.push(&tail[..end]);
        rest = &tail[end + 1..];
    }
    names
}

/// Returns the internal class name of a single field descriptor of the form `Lname;`,
/// looking through array dimensions.
#[must_use]
pub fn field_type_class_name(descriptor: &str) -> Option<&str> {
    descriptor
        .trim_start_matches('[')
        .strip_prefix('L')?
        .strip_suffix(';')
}

/// Returns the internal class names mentioned in a generic signature (class, method or
/// field signature), in order. Type variables are skipped; inner class suffixes are
/// reported as their full `Outer$Inner` name.
#[must_use]
pub fn signature_class_names(signature: &str) -> Vec<String> {
    let mut parser = SignatureParser {
        bytes: signature.as_bytes(),
        pos: 0,
        names: Vec::new(),
    };
    parser.parse();
    parser.names
}

struct SignatureParser<'a> {
    bytes: &'a [u8],
    pos: usize,
    names: Vec<String>,
}

impl SignatureParser<'_> {
    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn parse(&mut self) {
        if self.peek() == Some(b'<') {
            self.pos += 1;
            self.formal_type_parameters();
        }
        while let Some(byte) = self.peek() {
            match byte {
                b'(' | b')' | b'^' | b'V' => self.pos += 1,
                _ => {
                    let before = self.pos;
                    self.type_signature();
                    if self.pos == before {
                        return;
                    }
                }
            }
        }
    }

    fn formal_type_parameters(&mut self) {
        while let Some(byte) = self.peek() {
            if byte == b'>' {
                self.pos += 1;
                return;
            }
            // identifier
            while self.peek().is_some_and(|b| b != b':') {
                self.pos += 1;
            }
            while self.peek() == Some(b':') {
                self.pos += 1;
                if matches!(self.peek(), Some(b'L' | b'T' | b'[')) {
                    self.type_signature();
                }
            }
        }
    }

    fn type_signature(&mut self) {
        match self.peek() {
            Some(b'L') => self.class_type_signature(),
            Some(b'T') => {
                while self.peek().is_some_and(|b| b != b';') {
                    self.pos += 1;
                }
                self.pos += 1;
            }
            Some(b'[' | b'+' | b'-') => {
                self.pos += 1;
                self.type_signature();
            }
            Some(b'*' | b'B' | b'C' | b'D' | b'F' | b'I' | b'J' | b'S' | b'Z' | b'V') => {
                self.pos += 1;
            }
            _ => {}
        }
    }

    fn class_type_signature(&mut self) {
        self.pos += 1;
        let mut name = self.identifier();
        loop {
            match self.peek() {
                Some(b'<') => {
                    self.pos += 1;
                    while self.peek().is_some_and(|b| b != b'>') {
                        let before = self.pos;
                        self.type_signature();
                        if self.pos == before {
                            return;
                        }
                    }
                    self.pos += 1;
                }
                Some(b'.') => {
                    self.pos += 1;
                    let inner = self.identifier();
                    name.push('$');
                    name.push_str(&inner);
                }
                Some(b';') => {
                    self.pos += 1;
                    self.names.push(name);
                    return;
                }
                _ => return,
            }
        }
    }

    fn identifier(&mut self) -> String {
        let start = self.pos;
        while self
            .peek()
            .is_some_and(|b| !matches!(b, b';' | b'<' | b'.' | b'>'))
        {
            self.pos += 1;
        }
        String::from_utf8_lossy(&self.bytes[start..self.pos]).into_owned()
    }
}

/// Converts an internal class name (`java/lang/String`) to its external form
/// (`java.lang.String`).
#[must_use]
pub fn external_class_name(internal: &str) -> String {
    internal.replace('/', ".")
}

/// Converts an external class name to its internal form.
#[must_use]
pub fn internal_class_name(external: &str) -> String {
    external.replace('.', "/")
}

/// Returns the simple name of a class: the part after the last package separator.
#[must_use]
pub fn simple_class_name(name: &str) -> &str {
    name.rsplit(['/', '.']).next().unwrap_or(name)
}
