const MAX_NEWLINE_RUN: usize = 2;
const MAX_CHAR_RUN: usize = 10;

/// Running transcript of one AI answer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StreamAccumulator {
    fragments: Vec<String>,
    transcript: String,
    complete: bool,
}

impl StreamAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a fragment unless it is already the tail of the transcript.
    /// Returns whether the transcript changed.
    pub fn push(&mut self, raw: &str) -> bool {
        if self.complete {
            return false;
        }

        let normalized = raw.replace('\r', "");
        if self.transcript.ends_with(normalized.as_str()) {
            return false;
        }

        self.transcript.push_str(&normalized);
        self.fragments.push(normalized);
        true
    }

    pub fn complete(&mut self) {
        self.complete = true;
    }

    pub fn reset(&mut self) {
        self.fragments.clear();
        self.transcript.clear();
        self.complete = false;
    }

    pub fn is_complete(&self) -> bool {
        self.complete
    }

    pub fn transcript(&self) -> &str {
        &self.transcript
    }

    pub fn fragments(&self) -> &[String] {
        &self.fragments
    }

    pub fn rendered(&self) -> String {
        trim_for_display(&self.transcript)
    }
}

/// Display cleanup for model output: drops carriage returns, caps blank-line
/// runs at one empty line, folds any other character repeated more than ten
/// times into a single occurrence, and trims outer whitespace.
pub fn trim_for_display(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().filter(|c| *c != '\r').peekable();

    while let Some(current) = chars.next() {
        let mut run = 1;
        while chars.peek() == Some(&current) {
            chars.next();
            run += 1;
        }

        let keep = if current == '\n' {
            run.min(MAX_NEWLINE_RUN)
        } else if run > MAX_CHAR_RUN {
            1
        } else {
            run
        };
        out.extend(std::iter::repeat(current).take(keep));
    }

    out.trim().to_string()
}
