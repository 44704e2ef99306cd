use crate::supercat::Category;

/// One pre-tagged word: a surface form, its part of speech, and the
/// candidate lexical categories ("supertags") a supertagger assigned it,
/// each with its own log-probability prior.
#[derive(Debug, Clone)]
pub struct WordEntry {
    pub word: String,
    pub pos: String,
    pub supertags: Vec<(Category, f64)>,
}

/// The tagged sentence a [`crate::driver::ParserDriver`] parses. Ingestion
/// (reading a corpus/tagger's output into this shape) is out of scope per
/// spec.md §1 — that's [`SentenceLoader`]'s job — but the shape itself is
/// needed by every in-scope component, so it's a concrete struct rather
/// than a trait.
#[derive(Debug, Clone, Default)]
pub struct Sentence {
    words: Vec<WordEntry>,
}

impl Sentence {
    pub fn new(words: Vec<WordEntry>) -> Self {
        Self { words }
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn word(&self, position: usize) -> &WordEntry {
        &self.words[position]
    }

    pub fn words(&self) -> &[WordEntry] {
        &self.words
    }
}

/// External collaborator: loads a tagged [`Sentence`] from wherever
/// supertags come from (a corpus file, a live supertagger). Specified only
/// by its signature, per spec.md §1 — no provided implementation in this
/// crate.
pub trait SentenceLoader {
    type Error;

    fn load(&mut self) -> Result<Option<Sentence>, Self::Error>;
}
