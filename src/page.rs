//! Button layouts. A [`Page`] fills the 8x8 grid, a [`PageSet`] holds up to [`MAX_PAGES`]
//! of them, one of which is active.

use crate::button::Button;
use crate::launchpad_mk2::{GridPosition, GRID_SIZE};

/// One page per page-select button
pub const MAX_PAGES: usize = GRID_SIZE as usize;

type Row = [Option<Button>; GRID_SIZE as usize];

/// A full grid layout. Cells without a button are empty: no action, LED off.
#[derive(Debug, Clone, Default)]
pub struct Page {
    cells: [Row; GRID_SIZE as usize],
}

impl Page {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `button` to `pos`, returning whatever was bound there before
    pub fn set(&mut self, pos: GridPosition, button: Button) -> Option<Button> {
        self.cell_mut(pos).replace(button)
    }

    pub fn clear(&mut self, pos: GridPosition) -> Option<Button> {
        self.cell_mut(pos).take()
    }

    pub fn get(&self, pos: GridPosition) -> Option<&Button> {
        self.cells[pos.row() as usize][pos.column() as usize].as_ref()
    }

    /// Like [`Self::get`] but with raw coordinates; `None` when out of range
    pub fn get_at(&self, row: usize, column: usize) -> Option<&Button> {
        self.cells.get(row)?.get(column)?.as_ref()
    }

    /// Every cell in refresh order, bound or not
    pub fn cells(&self) -> impl Iterator<Item = (GridPosition, Option<&Button>)> + '_ {
        GridPosition::all().map(move |pos| (pos, self.get(pos)))
    }

    pub fn bound_count(&self) -> usize {
        self.cells
            .iter()
            .flat_map(|row| row.iter())
            .filter(|cell| cell.is_some())
            .count()
    }

    fn cell_mut(&mut self, pos: GridPosition) -> &mut Option<Button> {
        &mut self.cells[pos.row() as usize][pos.column() as usize]
    }
}

/// The numbered pages of a layout. Slots may be empty, which behaves like a page without
/// any buttons. A current index outside the set means no page is active.
#[derive(Debug, Clone, Default)]
pub struct PageSet {
    pages: Vec<Option<Page>>,
    current: usize,
}

impl PageSet {
    /// An empty set with all [`MAX_PAGES`] slots unbound
    pub fn new() -> Self {
        Self {
            pages: vec![None; MAX_PAGES],
            current: 0,
        }
    }

    /// Builds a set from consecutive pages starting at index 0. Pages beyond [`MAX_PAGES`]
    /// are dropped.
    pub fn from_pages<I: IntoIterator<Item = Page>>(pages: I) -> Self {
        let mut set = Self::new();
        for (index, page) in pages.into_iter().enumerate() {
            if index >= MAX_PAGES {
                log::warn!("Dropping page {}, only {} pages fit", index, MAX_PAGES);
                break;
            }
            set.pages[index] = Some(page);
        }
        set
    }

    /// Puts `page` into slot `index`. Returns the page back if the slot doesn't exist.
    pub fn insert(&mut self, index: usize, page: Page) -> Result<(), Page> {
        match self.pages.get_mut(index) {
            Some(slot) => {
                *slot = Some(page);
                Ok(())
            }
            None => Err(page),
        }
    }

    /// Number of page slots
    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    pub fn page(&self, index: usize) -> Option<&Page> {
        self.pages.get(index)?.as_ref()
    }

    /// The button bound at `pos` on page `page_index`. `None` for a missing page or an
    /// empty cell.
    pub fn button_at(&self, page_index: usize, pos: GridPosition) -> Option<&Button> {
        self.page(page_index)?.get(pos)
    }

    pub fn current_page(&self) -> usize {
        self.current
    }

    /// Only changes the bookkeeping. The LEDs are the caller's job.
    pub fn set_current_page(&mut self, index: usize) {
        self.current = index;
    }

    /// Whether the current index refers to an existing slot
    pub fn has_active_page(&self) -> bool {
        self.current < self.pages.len()
    }

    pub fn current_button(&self, pos: GridPosition) -> Option<&Button> {
        self.button_at(self.current, pos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pos(row: u8, column: u8) -> GridPosition {
        GridPosition::new(row, column).unwrap()
    }

    #[test]
    fn test_button_at_fails_soft() {
        let mut page = Page::new();
        page.set(pos(0, 0), Button::keystroke(0x41, 0x3F3F00));
        let set = PageSet::from_pages(vec![page]);

        assert_eq!(set.len(), MAX_PAGES);
        assert!(set.button_at(0, pos(0, 0)).is_some());
        assert!(set.button_at(0, pos(0, 1)).is_none());
        // Empty slot
        assert!(set.button_at(1, pos(0, 0)).is_none());
        for page_index in set.len()..set.len() + 10 {
            assert!(set.button_at(page_index, pos(0, 0)).is_none());
        }
        assert!(set.button_at(usize::MAX, pos(0, 0)).is_none());
    }

    #[test]
    fn test_get_at_out_of_range() {
        let mut page = Page::new();
        page.set(pos(7, 7), Button::keystroke(1, 0));

        assert!(page.get_at(7, 7).is_some());
        assert!(page.get_at(8, 7).is_none());
        assert!(page.get_at(7, 8).is_none());
    }

    #[test]
    fn test_current_page() {
        let mut set = PageSet::from_pages(vec![Page::new(), Page::new()]);
        assert_eq!(set.current_page(), 0);

        set.set_current_page(1);
        assert_eq!(set.current_page(), 1);
        assert!(set.has_active_page());

        set.set_current_page(42);
        assert!(!set.has_active_page());
        assert!(set.current_button(pos(0, 0)).is_none());
    }

    #[test]
    fn test_page_set_bounds() {
        let set = PageSet::from_pages((0..MAX_PAGES + 3).map(|_| Page::new()));
        assert_eq!(set.len(), MAX_PAGES);

        let mut set = PageSet::new();
        assert!(set.insert(MAX_PAGES, Page::new()).is_err());
        assert!(set.insert(3, Page::new()).is_ok());
        assert!(set.page(3).is_some());
        assert!(set.page(2).is_none());
    }

    #[test]
    fn test_page_cells() {
        let mut page = Page::new();
        assert!(page.set(pos(1, 2), Button::keystroke(1, 0)).is_none());
        assert!(page.set(pos(1, 2), Button::keystroke(2, 0)).is_some());
        assert_eq!(page.bound_count(), 1);
        assert_eq!(page.cells().count(), 64);
        assert_eq!(page.cells().filter(|(_, b)| b.is_some()).count(), 1);

        assert!(page.clear(pos(1, 2)).is_some());
        assert_eq!(page.bound_count(), 0);
    }
}
