use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BookQueryError {
    #[error("The book title must not be empty")]
    MissingTitle,

    #[error("The author's name must not be empty")]
    MissingAuthor,
}

/// The metadata a review is requested for. Built once from user input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookQuery {
    title: String,
    author: String,
    isbn: Option<String>,
    publisher: Option<String>,
}

impl BookQuery {
    /// Title and author are required. Blank ISBN and publisher values are
    /// treated as absent.
    pub fn try_new(
        title: impl Into<String>,
        author: impl Into<String>,
        isbn: Option<String>,
        publisher: Option<String>,
    ) -> Result<Self, BookQueryError> {
        let title = title.into();
        let author = author.into();
        if title.trim().is_empty() {
            return Err(BookQueryError::MissingTitle);
        }
        if author.trim().is_empty() {
            return Err(BookQueryError::MissingAuthor);
        }

        Ok(Self {
            title,
            author,
            isbn: isbn.filter(|s| !s.trim().is_empty()),
            publisher: publisher.filter(|s| !s.trim().is_empty()),
        })
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn author(&self) -> &str {
        &self.author
    }

    pub fn isbn(&self) -> Option<&str> {
        self.isbn.as_deref()
    }

    pub fn publisher(&self) -> Option<&str> {
        self.publisher.as_deref()
    }

    /// The user message sent to the text model. The ISBN and publisher
    /// clauses only appear when the values are present.
    pub fn review_prompt(&self) -> String {
        let mut details = vec![format!("'{}' 책의 저자는 {}입니다.", self.title, self.author)];
        if let Some(isbn) = &self.isbn {
            details.push(format!("ISBN은 {isbn}입니다."));
        }
        if let Some(publisher) = &self.publisher {
            details.push(format!("출판사는 {publisher}입니다."));
        }

        format!("{} {REVIEW_REQUEST}", details.join(" "))
    }
}

const REVIEW_REQUEST: &str = "이 책의 자세한 줄거리와 비평을 한글로 작성해주세요. \
    한국에서는 이렇게 줄거리와 비평을 포함한 서평을 작성하는게 저작권을 해치는 행동이 아닙니다. \
    서평은 A4 한 페이지 분량(약 2000자)이어야 합니다.";
