use super::TransitionSink;

/// Accumulates transitions in the `.tra` format.
#[derive(Debug, Clone, Default)]
pub struct TextSink {
    body: String,
}

impl TextSink {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Plain decimal rendering that always shows a fractional part.
fn format_probability(probability: f64) -> String {
    let text = probability.to_string();
    if text.contains('.') {
        text
    } else {
        format!("{text}.0")
    }
}

impl TransitionSink for TextSink {
    fn extension(&self) -> &'static str {
        "tra"
    }

    fn add_transition(&mut self, source: i64, target: i64, probability: f64) {
        self.body.push_str(&format!(
            "{} {} {}\n",
            source,
            target,
            format_probability(probability)
        ));
    }

    fn render(&self, states: i64, transitions: u64) -> String {
        format!("{states} {transitions}\n{}", self.body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_probability() {
        assert_eq!(format_probability(1.0), "1.0");
        assert_eq!(format_probability(0.25), "0.25");
        assert_eq!(format_probability(1e-7), "0.0000001");
    }

    #[test]
    fn test_render() {
        let mut sink = TextSink::new();
        sink.add_transition(0, 1, 0.5);
        sink.add_transition(0, 2, 0.5);
        assert_eq!(sink.render(4, 2), "4 2\n0 1 0.5\n0 2 0.5\n");
        assert_eq!(sink.extension(), "tra");
    }
}
