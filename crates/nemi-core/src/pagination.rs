//! Page-number pagination over an in-memory result list.
//!
//! Out-of-range requests never fail through [`Paginator::page_or_last`]: a
//! page number that is not an integer falls back to page 1, and any page outside
//! `1..=num_pages` clamps to the last page.

use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use std::num::IntErrorKind;

/// Reasons a specific page number cannot be served.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PageError {
    #[error("That page number is not an integer")]
    NotAnInteger,
    #[error("That page number is less than 1")]
    LessThanOne,
    #[error("That page contains no results")]
    Empty,
}

/// Represents a single page of results
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    /// Items in this page
    pub object_list: Vec<T>,
    /// Current page number (1-indexed)
    pub number: usize,
    /// Total number of pages
    pub num_pages: usize,
    /// Total number of items across all pages
    pub count: usize,
    /// Items per page
    pub page_size: usize,
}

impl<T> Page<T> {
    /// Returns the 1-based index of the first item on this page
    ///
    /// # Examples
    ///
    /// ```
    /// use nemi_core::Paginator;
    ///
    /// let paginator = Paginator::new((1..=45).collect::<Vec<_>>(), 20);
    /// let page = paginator.page(2).unwrap();
    /// assert_eq!(page.start_index(), 21);
    /// assert_eq!(page.end_index(), 40);
    /// ```
    pub fn start_index(&self) -> usize {
        if self.object_list.is_empty() {
            0
        } else {
            (self.number - 1) * self.page_size + 1
        }
    }

    pub fn end_index(&self) -> usize {
        if self.object_list.is_empty() {
            0
        } else {
            self.start_index() + self.object_list.len() - 1
        }
    }

    pub fn has_next(&self) -> bool {
        self.number < self.num_pages
    }

    pub fn has_previous(&self) -> bool {
        self.number > 1
    }

    pub fn has_other_pages(&self) -> bool {
        self.has_previous() || self.has_next()
    }

    pub fn next_page_number(&self) -> Option<usize> {
        self.has_next().then(|| self.number + 1)
    }

    pub fn previous_page_number(&self) -> Option<usize> {
        self.has_previous().then(|| self.number - 1)
    }

    pub fn len(&self) -> usize {
        self.object_list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.object_list.is_empty()
    }
}

// Templates need the derived navigation values, not only the stored fields.
impl<T: Serialize> Serialize for Page<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Page", 11)?;
        state.serialize_field("object_list", &self.object_list)?;
        state.serialize_field("number", &self.number)?;
        state.serialize_field("num_pages", &self.num_pages)?;
        state.serialize_field("count", &self.count)?;
        state.serialize_field("has_next", &self.has_next())?;
        state.serialize_field("has_previous", &self.has_previous())?;
        state.serialize_field("has_other_pages", &self.has_other_pages())?;
        state.serialize_field("next_page_number", &self.next_page_number())?;
        state.serialize_field("previous_page_number", &self.previous_page_number())?;
        state.serialize_field("start_index", &self.start_index())?;
        state.serialize_field("end_index", &self.end_index())?;
        state.end()
    }
}

/// Splits a result list into fixed-size pages.
///
/// An empty list still has one (empty) first page.
#[derive(Debug, Clone)]
pub struct Paginator<T> {
    items: Vec<T>,
    page_size: usize,
}

impl<T: Clone> Paginator<T> {
    /// Create a paginator. A page size of zero is treated as one.
    pub fn new(items: Vec<T>, page_size: usize) -> Self {
        Self {
            items,
            page_size: page_size.max(1),
        }
    }

    pub fn count(&self) -> usize {
        self.items.len()
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Total number of pages, never less than one.
    ///
    /// # Examples
    ///
    /// ```
    /// use nemi_core::Paginator;
    ///
    /// assert_eq!(Paginator::new(Vec::<u8>::new(), 20).num_pages(), 1);
    /// assert_eq!(Paginator::new(vec![0u8; 20], 20).num_pages(), 1);
    /// assert_eq!(Paginator::new(vec![0u8; 41], 20).num_pages(), 3);
    /// ```
    pub fn num_pages(&self) -> usize {
        if self.items.is_empty() {
            1
        } else {
            self.items.len().div_ceil(self.page_size)
        }
    }

    /// Return the requested page, or why it does not exist.
    pub fn page(&self, number: usize) -> Result<Page<T>, PageError> {
        if number < 1 {
            return Err(PageError::LessThanOne);
        }
        let num_pages = self.num_pages();
        if number > num_pages {
            return Err(PageError::Empty);
        }

        let start = (number - 1) * self.page_size;
        let end = std::cmp::min(start + self.page_size, self.items.len());
        let object_list = if start < end {
            self.items[start..end].to_vec()
        } else {
            Vec::new()
        };

        Ok(Page {
            object_list,
            number,
            num_pages,
            count: self.items.len(),
            page_size: self.page_size,
        })
    }

    /// Parse a raw `page` parameter. Missing means 1.
    ///
    /// An integer too large for `i64` is [`PageError::Empty`], any other
    /// unparsable text is [`PageError::NotAnInteger`].
    pub fn parse_page_number(raw: Option<&str>) -> Result<i64, PageError> {
        let Some(value) = raw else {
            return Ok(1);
        };
        value.trim().parse::<i64>().map_err(|err| match err.kind() {
            IntErrorKind::PosOverflow | IntErrorKind::NegOverflow => PageError::Empty,
            _ => PageError::NotAnInteger,
        })
    }

    /// Serve the page named by a raw query parameter, clamping invalid numbers.
    ///
    /// # Examples
    ///
    /// ```
    /// use nemi_core::Paginator;
    ///
    /// let paginator = Paginator::new((1..=45).collect::<Vec<_>>(), 20);
    ///
    /// assert_eq!(paginator.page_or_last(Some("2")).number, 2);
    /// assert_eq!(paginator.page_or_last(Some("9999")).number, 3);
    /// assert_eq!(paginator.page_or_last(Some("0")).number, 3);
    /// assert_eq!(paginator.page_or_last(Some("two")).number, 1);
    /// assert_eq!(paginator.page_or_last(None).number, 1);
    /// ```
    pub fn page_or_last(&self, raw: Option<&str>) -> Page<T> {
        let last = self.num_pages();
        let number = match Self::parse_page_number(raw) {
            Ok(number) if number >= 1 && number as u64 <= last as u64 => number as usize,
            Err(PageError::NotAnInteger) => 1,
            _ => last,
        };
        match self.page(number) {
            Ok(page) => page,
            // num_pages() is always a valid page
            Err(_) => Page {
                object_list: Vec::new(),
                number: last,
                num_pages: last,
                count: self.items.len(),
                page_size: self.page_size,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};

    #[fixture]
    fn fifty_items() -> Paginator<usize> {
        Paginator::new((1..=50).collect(), 20)
    }

    #[rstest]
    fn test_last_page_holds_remainder(fifty_items: Paginator<usize>) {
        // Act
        let page = fifty_items.page(3).unwrap();

        // Assert
        assert_eq!(page.object_list, (41..=50).collect::<Vec<_>>());
        assert!(!page.has_next());
        assert!(page.has_previous());
        assert_eq!(page.previous_page_number(), Some(2));
    }

    #[rstest]
    fn test_out_of_range_page_equals_last_page(fifty_items: Paginator<usize>) {
        // Act
        let clamped = fifty_items.page_or_last(Some("9999"));
        let last = fifty_items.page(3).unwrap();

        // Assert
        assert_eq!(clamped, last);
    }

    #[rstest]
    #[case(Some("abc"), 1)]
    #[case(Some(""), 1)]
    #[case(Some("-4"), 3)]
    #[case(Some("3"), 3)]
    #[case(Some(" 2 "), 2)]
    #[case(Some("99999999999999999999"), 3)]
    #[case(Some("-99999999999999999999"), 3)]
    #[case(Some("12abc"), 1)]
    fn test_page_parameter_fallbacks(
        fifty_items: Paginator<usize>,
        #[case] raw: Option<&str>,
        #[case] expected: usize,
    ) {
        // Act
        let page = fifty_items.page_or_last(raw);

        // Assert
        assert_eq!(page.number, expected);
    }

    #[rstest]
    fn test_empty_list_has_one_empty_page() {
        // Arrange
        let paginator: Paginator<usize> = Paginator::new(Vec::new(), 20);

        // Act
        let page = paginator.page_or_last(Some("5"));

        // Assert
        assert_eq!(page.number, 1);
        assert!(page.is_empty());
        assert_eq!(page.start_index(), 0);
    }

    #[rstest]
    fn test_page_errors(fifty_items: Paginator<usize>) {
        assert_eq!(fifty_items.page(0), Err(PageError::LessThanOne));
        assert_eq!(fifty_items.page(4), Err(PageError::Empty));
    }

    #[rstest]
    fn test_page_serializes_navigation(fifty_items: Paginator<usize>) {
        // Act
        let value = serde_json::to_value(fifty_items.page(2).unwrap()).unwrap();

        // Assert
        assert_eq!(value["has_next"], true);
        assert_eq!(value["next_page_number"], 3);
        assert_eq!(value["start_index"], 21);
        assert_eq!(value["object_list"].as_array().unwrap().len(), 20);
    }
}
