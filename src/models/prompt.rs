use std::fmt;

/// One block of the prompt. Only the free-text prefix has no header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub header: Option<String>,
    pub lines: Vec<String>,
}

impl Section {
    pub fn new(header: impl Into<String>, lines: Vec<String>) -> Self {
        Section {
            header: Some(header.into()),
            lines,
        }
    }

    pub fn untitled(lines: Vec<String>) -> Self {
        Section { header: None, lines }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(ref header) = self.header {
            writeln!(f, "{}", header)?;
        }
        for line in &self.lines {
            writeln!(f, "{}", line)?;
        }
        Ok(())
    }
}

/// The ordered text sent to the generation endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptDocument {
    sections: Vec<Section>,
}

impl PromptDocument {
    pub fn new(sections: Vec<Section>) -> Self {
        PromptDocument { sections }
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    pub fn section(&self, header: &str) -> Option<&Section> {
        self.sections
            .iter()
            .find(|section| section.header.as_deref() == Some(header))
    }
}

impl fmt::Display for PromptDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, section) in self.sections.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}", section)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationReply {
    pub text: String,
}
