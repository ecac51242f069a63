use crate::application::ports::ErrorKind;
use crate::domain::TranscriptFragment;

/// Restores segment order and joins fragment texts with a single newline.
///
/// Fragments may arrive in any order; exactly one fragment per index in
/// `0..expected_segments` is required. Texts are copied verbatim.
pub fn assemble_transcript(
    mut fragments: Vec<TranscriptFragment>,
    expected_segments: usize,
) -> Result<String, AssemblyError> {
    if expected_segments == 0 || fragments.is_empty() {
        return Err(AssemblyError::NoFragments);
    }

    fragments.sort_by_key(|f| f.segment_index);

    for (position, fragment) in fragments.iter().enumerate() {
        if fragment.segment_index < position {
            return Err(AssemblyError::DuplicateIndex(fragment.segment_index));
        }
        if fragment.segment_index > position {
            return Err(AssemblyError::MissingIndex(position));
        }
    }

    if fragments.len() < expected_segments {
        return Err(AssemblyError::MissingIndex(fragments.len()));
    }
    if fragments.len() > expected_segments {
        return Err(AssemblyError::UnexpectedIndex(expected_segments));
    }

    let texts: Vec<&str> = fragments.iter().map(|f| f.text.as_str()).collect();
    Ok(texts.join("\n"))
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AssemblyError {
    #[error("no transcript fragments to assemble")]
    NoFragments,
    #[error("missing fragment for segment {0}")]
    MissingIndex(usize),
    #[error("duplicate fragment for segment {0}")]
    DuplicateIndex(usize),
    #[error("fragment for unknown segment {0}")]
    UnexpectedIndex(usize),
}

impl AssemblyError {
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::AssemblyInvariant
    }
}
