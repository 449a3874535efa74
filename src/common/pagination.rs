use serde::Deserialize;
use utoipa::IntoParams;

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PageParams {
    /// Page number, starting at 1. Anything unparsable means the first page.
    pub page: Option<String>,
}

impl PageParams {
    pub fn requested(&self) -> Option<i64> {
        self.page.as_deref()?.trim().parse().ok()
    }
}

/// Largest page size a [`Paginator`] accepts.
pub const MAX_PER_PAGE: i64 = 1_000;

/// Splits ordered collections into pages of a fixed size.
#[derive(Debug, Clone, Copy)]
pub struct Paginator {
    per_page: i64,
}

impl Paginator {
    pub fn new(per_page: i64) -> Self {
        Self {
            per_page: per_page.clamp(1, MAX_PER_PAGE),
        }
    }

    pub fn per_page(&self) -> i64 {
        self.per_page
    }

    /// Resolves the requested page against `count` items. Out of range
    /// numbers land on the first or last page.
    pub fn window(&self, count: i64, requested: Option<i64>) -> PageWindow {
        let count = count.max(0);
        let total_pages =
            (count / self.per_page + i64::from(count % self.per_page != 0)).max(1);
        let number = requested.unwrap_or(1).clamp(1, total_pages);

        PageWindow {
            number,
            total_pages,
            count,
            per_page: self.per_page,
            offset: (number - 1) * self.per_page,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub number: i64,
    pub total_pages: i64,
    pub count: i64,
    pub per_page: i64,
    pub offset: i64,
}

impl PageWindow {
    pub fn limit(&self) -> i64 {
        self.per_page
    }

    /// Items that fall on this page.
    pub fn len(&self) -> i64 {
        (self.count - self.offset).clamp(0, self.per_page)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn into_page<T>(self, items: Vec<T>) -> Page<T> {
        Page {
            items,
            number: self.number,
            total_pages: self.total_pages,
            count: self.count,
            per_page: self.per_page,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub number: i64,
    pub total_pages: i64,
    pub count: i64,
    pub per_page: i64,
}

impl<T> Page<T> {
    pub fn has_next(&self) -> bool {
        self.number < self.total_pages
    }

    pub fn has_previous(&self) -> bool {
        self.number > 1
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            number: self.number,
            total_pages: self.total_pages,
            count: self.count,
            per_page: self.per_page,
        }
    }
}
