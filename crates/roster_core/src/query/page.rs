//! Paging requests and page/slice results.
//!
//! # Invariants
//! - `PageRequest::size` is always greater than zero.
//! - `Page::total_pages() == ceil(total_elements / size)`.
//! - `Slice` never carries a total; `has_next` comes from a one-row lookahead.

use std::error::Error;
use std::fmt::{Display, Formatter};

/// Page size used when a caller does not choose one.
pub const DEFAULT_PAGE_SIZE: u32 = 5;

/// Rejected paging input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PagingError {
    ZeroPageSize,
    PageSizeTooLarge { size: u32, max: u32 },
    /// Sort property unknown for the queried entity.
    UnknownSortProperty {
        entity: &'static str,
        property: String,
    },
}

impl Display for PagingError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ZeroPageSize => write!(f, "page size must be greater than zero"),
            Self::PageSizeTooLarge { size, max } => {
                write!(f, "page size {size} exceeds maximum {max}")
            }
            Self::UnknownSortProperty { entity, property } => {
                write!(f, "unknown sort property `{property}` for {entity}")
            }
        }
    }
}

impl Error for PagingError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

impl Direction {
    pub(crate) fn sql(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// One ordering term: entity property name plus direction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    pub property: String,
    pub direction: Direction,
}

/// Ordered list of ordering terms. Empty means "repository default".
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Sort {
    orders: Vec<Order>,
}

impl Sort {
    pub fn unsorted() -> Self {
        Self::default()
    }

    pub fn by(property: impl Into<String>, direction: Direction) -> Self {
        Self::unsorted().then(property, direction)
    }

    pub fn asc(property: impl Into<String>) -> Self {
        Self::by(property, Direction::Asc)
    }

    pub fn desc(property: impl Into<String>) -> Self {
        Self::by(property, Direction::Desc)
    }

    /// Appends a lower-priority ordering term.
    pub fn then(mut self, property: impl Into<String>, direction: Direction) -> Self {
        self.orders.push(Order {
            property: property.into(),
            direction,
        });
        self
    }

    pub fn orders(&self) -> &[Order] {
        &self.orders
    }

    pub fn is_unsorted(&self) -> bool {
        self.orders.is_empty()
    }
}

/// Zero-based page index, positive page size and ordering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    page: u32,
    size: u32,
    sort: Sort,
}

impl PageRequest {
    pub fn new(page: u32, size: u32, sort: Sort) -> Result<Self, PagingError> {
        if size == 0 {
            return Err(PagingError::ZeroPageSize);
        }
        Ok(Self { page, size, sort })
    }

    /// Unsorted request; the repository applies its default ordering.
    pub fn of(page: u32, size: u32) -> Result<Self, PagingError> {
        Self::new(page, size, Sort::unsorted())
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn sort(&self) -> &Sort {
        &self.sort
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.page) * u64::from(self.size)
    }

    pub fn next(&self) -> Self {
        Self {
            page: self.page.saturating_add(1),
            size: self.size,
            sort: self.sort.clone(),
        }
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 0,
            size: DEFAULT_PAGE_SIZE,
            sort: Sort::unsorted(),
        }
    }
}

/// One page of results plus the total element count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    content: Vec<T>,
    number: u32,
    size: u32,
    total_elements: u64,
}

impl<T> Page<T> {
    pub fn new(content: Vec<T>, request: &PageRequest, total_elements: u64) -> Self {
        Self {
            content,
            number: request.page,
            size: request.size,
            total_elements,
        }
    }

    pub fn content(&self) -> &[T] {
        &self.content
    }

    pub fn into_content(self) -> Vec<T> {
        self.content
    }

    pub fn number(&self) -> u32 {
        self.number
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn number_of_elements(&self) -> usize {
        self.content.len()
    }

    pub fn total_elements(&self) -> u64 {
        self.total_elements
    }

    pub fn total_pages(&self) -> u64 {
        self.total_elements.div_ceil(u64::from(self.size))
    }

    pub fn is_first(&self) -> bool {
        !self.has_previous()
    }

    pub fn is_last(&self) -> bool {
        !self.has_next()
    }

    pub fn has_next(&self) -> bool {
        u64::from(self.number) + 1 < self.total_pages()
    }

    pub fn has_previous(&self) -> bool {
        self.number > 0
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            content: self.content.into_iter().map(f).collect(),
            number: self.number,
            size: self.size,
            total_elements: self.total_elements,
        }
    }
}

/// A page-like window without a total count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slice<T> {
    content: Vec<T>,
    number: u32,
    size: u32,
    has_next: bool,
}

impl<T> Slice<T> {
    /// Builds a slice from up to `size + 1` fetched rows, dropping the
    /// lookahead row when present.
    pub fn from_lookahead(mut rows: Vec<T>, request: &PageRequest) -> Self {
        let size = request.size as usize;
        let has_next = rows.len() > size;
        rows.truncate(size);
        Self {
            content: rows,
            number: request.page,
            size: request.size,
            has_next,
        }
    }

    pub fn content(&self) -> &[T] {
        &self.content
    }

    pub fn into_content(self) -> Vec<T> {
        self.content
    }

    pub fn number(&self) -> u32 {
        self.number
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn number_of_elements(&self) -> usize {
        self.content.len()
    }

    pub fn has_next(&self) -> bool {
        self.has_next
    }

    pub fn has_previous(&self) -> bool {
        self.number > 0
    }

    pub fn is_first(&self) -> bool {
        !self.has_previous()
    }

    pub fn is_last(&self) -> bool {
        !self.has_next
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Slice<U> {
        Slice {
            content: self.content.into_iter().map(f).collect(),
            number: self.number,
            size: self.size,
            has_next: self.has_next,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Page, PageRequest, PagingError, Slice, Sort, DEFAULT_PAGE_SIZE};

    #[test]
    fn zero_size_is_rejected() {
        assert_eq!(PageRequest::of(0, 0), Err(PagingError::ZeroPageSize));
    }

    #[test]
    fn default_request_is_first_page_of_five_unsorted() {
        let request = PageRequest::default();
        assert_eq!(request.page(), 0);
        assert_eq!(request.size(), DEFAULT_PAGE_SIZE);
        assert!(request.sort().is_unsorted());
    }

    #[test]
    fn page_math_for_five_elements_in_pages_of_three() {
        let request = PageRequest::new(0, 3, Sort::desc("user_name")).unwrap();
        let page = Page::new(vec![1, 2, 3], &request, 5);
        assert_eq!(page.number_of_elements(), 3);
        assert_eq!(page.total_elements(), 5);
        assert_eq!(page.total_pages(), 2);
        assert!(page.is_first());
        assert!(page.has_next());

        let last = Page::new(vec![4, 5], &request.next(), 5);
        assert!(!last.is_first());
        assert!(last.is_last());
        assert!(last.has_previous());
    }

    #[test]
    fn empty_page_has_zero_pages() {
        let page: Page<u8> = Page::new(Vec::new(), &PageRequest::default(), 0);
        assert_eq!(page.total_pages(), 0);
        assert!(page.is_first());
        assert!(!page.has_next());
    }

    #[test]
    fn slice_drops_lookahead_row() {
        let request = PageRequest::of(0, 3).unwrap();
        let slice = Slice::from_lookahead(vec![1, 2, 3, 4], &request);
        assert_eq!(slice.content(), &[1, 2, 3]);
        assert!(slice.has_next());

        let tail = Slice::from_lookahead(vec![4, 5], &request.next());
        assert_eq!(tail.content(), &[4, 5]);
        assert!(tail.is_last());
    }

    #[test]
    fn map_keeps_paging_metadata() {
        let request = PageRequest::of(1, 2).unwrap();
        let page = Page::new(vec![1, 2], &request, 7).map(|value| value * 10);
        assert_eq!(page.content(), &[10, 20]);
        assert_eq!(page.number(), 1);
        assert_eq!(page.total_pages(), 4);
    }
}
