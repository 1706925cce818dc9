//! Query construction for the content API search endpoint

/// A search predicate
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    /// Exact match of a field against a value
    At { path: String, value: String },
}

impl Predicate {
    pub fn at(path: impl Into<String>, value: impl Into<String>) -> Self {
        Predicate::At {
            path: path.into(),
            value: value.into(),
        }
    }

    /// `[at(document.type, "<doc_type>")]`
    pub fn document_type(doc_type: &str) -> Self {
        Self::at("document.type", doc_type)
    }

    /// `[at(document.id, "<id>")]`
    pub fn id(id: &str) -> Self {
        Self::at("document.id", id)
    }

    /// `[at(my.<doc_type>.uid, "<uid>")]`
    pub fn uid(doc_type: &str, uid: &str) -> Self {
        Self::at(format!("my.{}.uid", doc_type), uid)
    }

    fn to_query_fragment(&self) -> String {
        match self {
            Predicate::At { path, value } => {
                format!("[at({}, \"{}\")]", path, value.replace('"', "\\\""))
            }
        }
    }
}

/// Result ordering
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ordering {
    pub field: String,
    pub descending: bool,
}

impl Ordering {
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            descending: false,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            descending: true,
        }
    }
}

/// A search query. The ref is supplied by the client at send time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    pub predicates: Vec<Predicate>,
    pub fetch: Vec<String>,
    pub page_size: Option<u32>,
    /// Preview ref; `None` means the master ref
    pub reference: Option<String>,
    pub after: Option<String>,
    pub orderings: Vec<Ordering>,
}

impl Query {
    /// All documents of a custom type
    pub fn documents_of_type(doc_type: &str) -> Self {
        Self {
            predicates: vec![Predicate::document_type(doc_type)],
            ..Default::default()
        }
    }

    pub fn predicate(mut self, predicate: Predicate) -> Self {
        self.predicates.push(predicate);
        self
    }

    /// Restrict returned fields, e.g. `post.title`
    pub fn fetch<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fetch.extend(fields.into_iter().map(Into::into));
        self
    }

    pub fn page_size(mut self, size: u32) -> Self {
        self.page_size = Some(size);
        self
    }

    pub fn reference(mut self, reference: Option<String>) -> Self {
        self.reference = reference;
        self
    }

    /// Only return documents after this document id in the ordering
    pub fn after(mut self, id: impl Into<String>) -> Self {
        self.after = Some(id.into());
        self
    }

    pub fn order_by(mut self, ordering: Ordering) -> Self {
        self.orderings.push(ordering);
        self
    }

    /// The `q` parameter
    pub fn q(&self) -> String {
        let fragments: String = self
            .predicates
            .iter()
            .map(Predicate::to_query_fragment)
            .collect();
        format!("[{}]", fragments)
    }

    /// Query-string pairs, given the ref the request should read from
    pub fn params(&self, reference: &str) -> Vec<(&'static str, String)> {
        let mut params = vec![("ref", reference.to_string()), ("q", self.q())];

        if !self.fetch.is_empty() {
            params.push(("fetch", self.fetch.join(",")));
        }
        if let Some(size) = self.page_size {
            params.push(("pageSize", size.to_string()));
        }
        if let Some(after) = &self.after {
            params.push(("after", after.clone()));
        }
        if !self.orderings.is_empty() {
            let fields: Vec<String> = self
                .orderings
                .iter()
                .map(|o| {
                    if o.descending {
                        format!("{} desc", o.field)
                    } else {
                        o.field.clone()
                    }
                })
                .collect();
            params.push(("orderings", format!("[{}]", fields.join(","))));
        }

        params
    }
}
