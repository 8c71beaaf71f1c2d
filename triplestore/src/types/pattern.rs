use super::{Field, Triple};

/// A query pattern: each field either bound to a term or left open.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Pattern<'a> {
    pub subject: Option<&'a [u8]>,
    pub predicate: Option<&'a [u8]>,
    pub object: Option<&'a [u8]>,
}

impl<'a> Pattern<'a> {
    /// A pattern with nothing bound; matches every triple.
    #[must_use]
    pub const fn any() -> Self {
        Self {
            subject: None,
            predicate: None,
            object: None,
        }
    }

    /// A pattern with every field bound to the given triple.
    #[must_use]
    pub fn exact(triple: &'a Triple) -> Self {
        Self {
            subject: Some(triple.subject.as_slice()),
            predicate: Some(triple.predicate.as_slice()),
            object: Some(triple.object.as_slice()),
        }
    }

    #[must_use]
    pub const fn with_subject(mut self, subject: &'a [u8]) -> Self {
        self.subject = Some(subject);
        self
    }

    #[must_use]
    pub const fn with_predicate(mut self, predicate: &'a [u8]) -> Self {
        self.predicate = Some(predicate);
        self
    }

    #[must_use]
    pub const fn with_object(mut self, object: &'a [u8]) -> Self {
        self.object = Some(object);
        self
    }

    #[must_use]
    pub const fn get(&self, field: Field) -> Option<&'a [u8]> {
        match field {
            Field::Subject => self.subject,
            Field::Predicate => self.predicate,
            Field::Object => self.object,
        }
    }

    /// Whether `triple` satisfies every bound field.
    #[must_use]
    pub fn matches(&self, triple: &Triple) -> bool {
        Field::ALL.into_iter().all(|field| {
            self.get(field)
                .is_none_or(|term| term == triple.get(field))
        })
    }
}

impl std::fmt::Display for Pattern<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, field) in Field::ALL.into_iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            let initial = &field.name()[..1];
            match self.get(field) {
                Some(term) => write!(f, "{initial}={}", String::from_utf8_lossy(term))?,
                None => write!(f, "{initial}=NULL")?,
            }
        }
        Ok(())
    }
}
