use role_common::ContentStatus;

/// Query for listing content records
#[derive(Debug, Clone)]
pub struct ContentQuery {
    pub status: Option<ContentStatus>,
    pub order: ContentOrder,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ContentOrder {
    /// most recently edited first
    #[default]
    RecentlyUpdated,
    /// upcoming first, records without a start last
    StartAt,
}

pub const MAX_PAGE_SIZE: u16 = 200;

impl Default for ContentQuery {
    fn default() -> Self {
        Self::new()
    }
}

impl ContentQuery {
    pub fn new() -> Self {
        Self {
            status: None,
            order: ContentOrder::default(),
            limit: None,
            offset: None,
        }
    }

    /// Only records with this status
    pub fn with_status(mut self, status: ContentStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn order_by(mut self, order: ContentOrder) -> Self {
        self.order = order;
        self
    }

    /// Set pagination using page number and page size
    ///
    /// Enforces invariants:
    /// - Page defaults to 1 if 0
    /// - Page size is capped at 200
    pub fn paginate(mut self, mut page: u16, mut page_size: u16) -> Self {
        if page == 0 {
            page = 1;
        }

        if page_size > MAX_PAGE_SIZE {
            page_size = MAX_PAGE_SIZE;
        }

        if page_size > 0 {
            let offset = ((page - 1) as i64) * (page_size as i64);
            self.offset = Some(offset);
            self.limit = Some(page_size as i64);
        }
        self
    }
}
