use thiserror::Error;

use crate::model::{CategoryIdError, ContentDecodeError, PageNumberError};
use crate::scroller::ScrollerError;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error(transparent)]
    CategoryId(#[from] CategoryIdError),
    #[error(transparent)]
    PageNumber(#[from] PageNumberError),
    #[error(transparent)]
    ContentDecode(#[from] ContentDecodeError),
    #[error(transparent)]
    Scroller(#[from] ScrollerError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CategoryId, ContentKind, PageNumber, decode_page};
    use crate::scroller::SentenceScroller;

    fn parse_all() -> Result<(), Error> {
        CategoryId::new("words")?;
        PageNumber::new(1)?;
        decode_page(ContentKind::Words, "[]")?;
        SentenceScroller::new(Vec::new())?;
        Ok(())
    }

    #[test]
    fn layer_errors_convert_into_core_error() {
        assert!(matches!(parse_all(), Err(Error::Scroller(_))));
        let err: Error = PageNumber::new(0).unwrap_err().into();
        assert!(matches!(err, Error::PageNumber(_)));
    }
}
