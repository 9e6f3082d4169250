//! Page range expressions such as `1-3,5,8-10`

use super::selection::PageSelection;

/// One comma-separated piece of a range expression, already resolved to
/// physical page numbers
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PageRangeToken {
    Single(usize),
    /// Inclusive, `start <= end`
    Range { start: usize, end: usize },
}

impl PageRangeToken {
    fn pages(self) -> std::ops::RangeInclusive<usize> {
        match self {
            PageRangeToken::Single(page) => page..=page,
            PageRangeToken::Range { start, end } => start..=end,
        }
    }
}

/// Resolves user-typed page references through the document's page labels
pub struct PageRangeParser<'a> {
    labels: &'a [String],
    total_pages: usize,
}

impl<'a> PageRangeParser<'a> {
    #[must_use]
    pub fn new(labels: &'a [String], total_pages: usize) -> Self {
        Self {
            labels,
            total_pages,
        }
    }

    /// Parse a whole expression. Unresolvable pieces are skipped; the result
    /// is ascending and duplicate-free.
    #[must_use]
    pub fn parse(&self, input: &str) -> PageSelection {
        let mut pages: Vec<usize> = input
            .split(',')
            .filter_map(|raw| self.parse_token(raw))
            .flat_map(PageRangeToken::pages)
            .collect();

        pages.sort_unstable();
        pages.dedup();
        PageSelection::from_sorted(pages)
    }

    /// Parse one comma-separated piece
    #[must_use]
    pub fn parse_token(&self, raw: &str) -> Option<PageRangeToken> {
        let token = raw.trim();
        if token.is_empty() {
            return None;
        }

        // Labels may contain dashes themselves ("A-1"), so try the whole token first
        if let Some(page) = self.resolve(token) {
            return Some(PageRangeToken::Single(page));
        }

        let (start, end) = token.split_once('-')?;
        let start = self.resolve(start.trim())?;
        let end = self.resolve(end.trim())?;

        Some(PageRangeToken::Range {
            start: start.min(end),
            end: start.max(end),
        })
    }

    /// Map a page label to its page number. Documents without labels are
    /// addressed by plain page numbers instead.
    #[must_use]
    pub fn resolve(&self, label: &str) -> Option<usize> {
        if label.is_empty() {
            return None;
        }

        if !self.labels.is_empty() {
            let page = self.labels.iter().position(|l| l == label)? + 1;
            return (page <= self.total_pages).then_some(page);
        }

        if !label.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }

        label
            .parse::<usize>()
            .ok()
            .filter(|page| (1..=self.total_pages).contains(page))
    }
}

/// Parse `input` against `page_labels` for a document of `total_pages`
#[must_use]
pub fn parse_page_ranges(input: &str, page_labels: &[String], total_pages: usize) -> PageSelection {
    PageRangeParser::new(page_labels, total_pages).parse(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| (*s).to_string()).collect()
    }

    fn parse(input: &str, total: usize) -> Vec<usize> {
        parse_page_ranges(input, &[], total).into()
    }

    #[test]
    fn parses_singles_and_ranges() {
        assert_eq!(parse("1-3,5,8-10", 10), vec![1, 2, 3, 5, 8, 9, 10]);
    }

    #[test]
    fn output_is_sorted_and_unique() {
        assert_eq!(parse("3,1-2,1", 5), vec![1, 2, 3]);
        assert_eq!(parse("4-2,3", 5), vec![2, 3, 4]);
    }

    #[test]
    fn invalid_tokens_are_skipped() {
        assert_eq!(parse("0,2,abc,6,1-,-3,3-9,4", 5), vec![2, 4]);
        assert_eq!(parse("1--3", 5), Vec::<usize>::new());
    }

    #[test]
    fn empty_input_selects_nothing() {
        assert!(parse("", 5).is_empty());
        assert!(parse(",,,", 5).is_empty());
        assert!(parse("1", 0).is_empty());
    }

    #[test]
    fn labels_resolve_to_their_pages() {
        let labels = labels(&["i", "ii", "1", "2", "3"]);
        let parser = PageRangeParser::new(&labels, 5);

        assert_eq!(parser.resolve("ii"), Some(2));
        assert_eq!(parser.resolve("1"), Some(3));
        assert_eq!(parser.parse("i-1").pages(), &[1, 2, 3]);
    }

    #[test]
    fn unlabeled_numbers_are_skipped_when_document_has_labels() {
        let labels = labels(&["i", "ii", "1", "2"]);

        assert!(parse_page_ranges("4", &labels, 4).is_empty());
        assert!(parse_page_ranges("3-4", &labels, 4).is_empty());
        // "1" is the label of page 3, "4" is no label at all
        assert!(parse_page_ranges("1-4", &labels, 4).is_empty());
        assert_eq!(parse_page_ranges("1-2,ii", &labels, 4).pages(), &[2, 3, 4]);
    }

    #[test]
    fn dashed_labels_resolve_as_single_pages() {
        let labels = labels(&["A-1", "A-2", "B-1"]);
        let parser = PageRangeParser::new(&labels, 3);

        assert_eq!(parser.parse_token("A-2"), Some(PageRangeToken::Single(2)));
        assert_eq!(parser.parse("B-1,A-1").pages(), &[1, 3]);
    }
}
