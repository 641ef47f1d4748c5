//! Cursor over the merged collection.
//!
//! Every move is all-or-nothing: a target outside `0..len` leaves the cursor
//! where it was instead of clamping to the boundary.

/// Distance of the "jump ten" buttons.
pub const PAGE_STEP: i64 = 10;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Cursor {
  index: usize,
}

impl Cursor {
  pub fn index(&self) -> usize { self.index }

  /// Returns true when the cursor moved.
  pub fn go_to_index(&mut self, i: i64, len: usize) -> bool {
    match usize::try_from(i) {
      Ok(i) if i < len => {
        let moved = i != self.index;
        self.index = i;
        moved
      }
      _ => false,
    }
  }

  pub fn go_to_first(&mut self, len: usize) -> bool {
    self.go_to_index(0, len)
  }

  pub fn go_to_last(&mut self, len: usize) -> bool {
    if len == 0 {
      return false;
    }
    self.go_to_index(len as i64 - 1, len)
  }

  pub fn change(&mut self, delta: i64, len: usize) -> bool {
    self.go_to_index(self.index as i64 + delta, len)
  }

  /// Jump to the first position whose id matches. Returns whether one was found.
  pub fn search_by_id<T>(&mut self, items: &[T], id: i64, id_of: impl Fn(&T) -> i64) -> bool {
    match items.iter().position(|it| id_of(it) == id) {
      Some(pos) => {
        self.index = pos;
        true
      }
      None => false,
    }
  }
}
