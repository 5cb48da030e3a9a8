//! Kanban Board
//!
//! Posts arranged in status columns. Orders inside a column are kept
//! sequential (0, 1, 2, ...) after every move.

use serde::{Deserialize, Serialize};

use crate::domain::{DomainError, DomainResult, Post, Status};

#[derive(Debug, Clone, PartialEq)]
pub struct BoardColumn {
    pub status: Status,
    pub cards: Vec<Post>,
}

/// New placement of one card after a move
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderChange {
    pub post_id: u32,
    pub status_id: u32,
    pub order: i32,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Board {
    pub columns: Vec<BoardColumn>,
    /// Posts whose status is missing or unknown
    pub unsorted: Vec<Post>,
}

impl Board {
    /// Columns follow status order, cards follow post order (ties by id).
    pub fn build(statuses: &[Status], posts: &[Post]) -> Self {
        let mut statuses = statuses.to_vec();
        statuses.sort_by_key(|s| (s.order, s.id));

        let mut columns: Vec<BoardColumn> = statuses
            .into_iter()
            .map(|status| BoardColumn { status, cards: Vec::new() })
            .collect();
        let mut unsorted = Vec::new();

        for post in posts {
            let column = post
                .status_id
                .and_then(|id| columns.iter_mut().find(|c| c.status.id == id));
            match column {
                Some(column) => column.cards.push(post.clone()),
                None => unsorted.push(post.clone()),
            }
        }
        for column in &mut columns {
            column.cards.sort_by_key(|p| (p.order, p.id));
        }

        Self { columns, unsorted }
    }

    pub fn column(&self, status_id: u32) -> Option<&BoardColumn> {
        self.columns.iter().find(|c| c.status.id == status_id)
    }

    /// Move a card to `to_index` within the `to_status` column. The index is
    /// clamped to the column length. Returns every card whose status or order
    /// changed, the moved card first.
    pub fn move_card(&mut self, post_id: u32, to_status: u32, to_index: usize) -> DomainResult<Vec<OrderChange>> {
        let target = self
            .columns
            .iter()
            .position(|c| c.status.id == to_status)
            .ok_or_else(|| DomainError::not_found::<Status>(to_status))?;

        let before: Vec<(u32, Option<u32>, i32)> = self
            .columns
            .iter()
            .flat_map(|c| c.cards.iter())
            .chain(self.unsorted.iter())
            .map(|p| (p.id, p.status_id, p.order))
            .collect();

        let mut card = self.take_card(post_id)?;
        card.status_id = Some(to_status);
        let cards = &mut self.columns[target].cards;
        let index = to_index.min(cards.len());
        cards.insert(index, card);

        for column in &mut self.columns {
            reindex(column);
        }

        let mut changes = Vec::new();
        for column in &self.columns {
            for post in &column.cards {
                let unchanged = before
                    .iter()
                    .any(|(id, status, order)| *id == post.id && *status == post.status_id && *order == post.order);
                if unchanged {
                    continue;
                }
                let change = OrderChange {
                    post_id: post.id,
                    status_id: column.status.id,
                    order: post.order,
                };
                if post.id == post_id {
                    changes.insert(0, change);
                } else {
                    changes.push(change);
                }
            }
        }
        Ok(changes)
    }

    fn take_card(&mut self, post_id: u32) -> DomainResult<Post> {
        for column in &mut self.columns {
            if let Some(i) = column.cards.iter().position(|p| p.id == post_id) {
                return Ok(column.cards.remove(i));
            }
        }
        if let Some(i) = self.unsorted.iter().position(|p| p.id == post_id) {
            return Ok(self.unsorted.remove(i));
        }
        Err(DomainError::not_found::<Post>(post_id))
    }
}

fn reindex(column: &mut BoardColumn) {
    for (order, post) in column.cards.iter_mut().enumerate() {
        post.order = order as i32;
    }
}
