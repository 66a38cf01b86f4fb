use serde::Serialize;

pub const DEFAULT_ITEMS_PER_PAGE: usize = 20;

/// One page of items together with the numbers a client needs to page further.
#[derive(Debug, Serialize)]
pub struct Paginated<T> {
    pub items: Vec<T>,
    pub page: usize,
    pub per_page: usize,
    pub total: usize,
    pub total_pages: usize,
}

impl<T> Paginated<T> {
    pub fn new(items: Vec<T>, current_page: usize, per_page: usize, total: usize) -> Self {
        let page = if current_page == 0 { 1 } else { current_page };
        let total_pages = if per_page == 0 {
            0
        } else {
            total.div_ceil(per_page)
        };

        Self {
            items,
            page,
            per_page,
            total,
            total_pages,
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Paginated<U> {
        Paginated {
            items: self.items.into_iter().map(f).collect(),
            page: self.page,
            per_page: self.per_page,
            total: self.total,
            total_pages: self.total_pages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_zero_is_treated_as_first_page() {
        let page = Paginated::new(vec![1, 2], 0, 20, 2);
        assert_eq!(page.page, 1);
        assert_eq!(page.total_pages, 1);
    }

    #[test]
    fn total_pages_rounds_up() {
        let page = Paginated::new(Vec::<i32>::new(), 3, 20, 41);
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.map(|n| n * 2).total, 41);
    }
}
