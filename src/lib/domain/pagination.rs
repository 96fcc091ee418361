use thiserror::Error;

/// A field a listing may be ordered by.
pub trait SortField: Copy + Sized {
    /// Field used when the caller supplies no usable sort key.
    const DEFAULT: Self;

    fn parse(raw: &str) -> Option<Self>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SortKey<F: SortField> {
    field: F,
    direction: SortDirection,
}

impl<F: SortField> SortKey<F> {
    pub fn new(field: F, direction: SortDirection) -> Self {
        Self { field, direction }
    }

    pub fn field(&self) -> F {
        self.field
    }

    pub fn direction(&self) -> SortDirection {
        self.direction
    }
}

#[derive(Clone, Debug, Error, PartialEq)]
#[error("cannot sort by {0}")]
pub struct SortByInvalidError(String);

/// Represents always valid listing window and ordering.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PageRequest<F: SortField> {
    sort: Vec<SortKey<F>>,
    limit: u32,
    page: u32,
}

impl<F: SortField> PageRequest<F> {
    pub const DEFAULT_LIMIT: u32 = 10;
    pub const DEFAULT_PAGE: u32 = 1;

    /// Builds a request from raw query values.
    ///
    /// `sort_by` is a comma separated list of `field:asc|desc` pairs; the direction defaults to
    /// ascending. Non-positive `limit` and `page` fall back to their defaults.
    pub fn new(
        sort_by: Option<&str>,
        limit: Option<i64>,
        page: Option<i64>,
    ) -> Result<Self, SortByInvalidError> {
        let mut sort = Vec::new();

        if let Some(sort_by) = sort_by {
            for criterion in sort_by.split(',').map(str::trim).filter(|c| !c.is_empty()) {
                let (raw_field, raw_direction) = match criterion.split_once(':') {
                    Some((field, direction)) => (field, Some(direction)),
                    None => (criterion, None),
                };

                let field = F::parse(raw_field)
                    .ok_or_else(|| SortByInvalidError(raw_field.to_string()))?;
                let direction = match raw_direction {
                    None | Some("asc") => SortDirection::Asc,
                    Some("desc") => SortDirection::Desc,
                    Some(_) => return Err(SortByInvalidError(criterion.to_string())),
                };

                sort.push(SortKey::new(field, direction));
            }
        }

        if sort.is_empty() {
            sort.push(SortKey::new(F::DEFAULT, SortDirection::Asc));
        }

        Ok(Self {
            sort,
            limit: positive_or(limit, Self::DEFAULT_LIMIT),
            page: positive_or(page, Self::DEFAULT_PAGE),
        })
    }

    pub fn sort(&self) -> &[SortKey<F>] {
        &self.sort
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.limit)
    }
}

impl<F: SortField> Default for PageRequest<F> {
    fn default() -> Self {
        Self {
            sort: vec![SortKey::new(F::DEFAULT, SortDirection::Asc)],
            limit: Self::DEFAULT_LIMIT,
            page: Self::DEFAULT_PAGE,
        }
    }
}

fn positive_or(value: Option<i64>, default: u32) -> u32 {
    value
        .filter(|v| *v > 0)
        .and_then(|v| u32::try_from(v).ok())
        .unwrap_or(default)
}

/// One page of a listing together with the totals needed to walk the rest of it.
#[derive(Clone, Debug, PartialEq)]
pub struct Page<T> {
    results: Vec<T>,
    page: u32,
    limit: u32,
    total_pages: u32,
    total_results: u64,
}

impl<T> Page<T> {
    pub fn new<F: SortField>(results: Vec<T>, request: &PageRequest<F>, total_results: u64) -> Self {
        let limit = u64::from(request.limit());
        let total_pages = u32::try_from(total_results.div_ceil(limit)).unwrap_or(u32::MAX);

        Self {
            results,
            page: request.page(),
            limit: request.limit(),
            total_pages,
            total_results,
        }
    }

    pub fn results(&self) -> &Vec<T> {
        &self.results
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    pub fn total_pages(&self) -> u32 {
        self.total_pages
    }

    pub fn total_results(&self) -> u64 {
        self.total_results
    }
}
