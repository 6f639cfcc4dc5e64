//! Containers and the items they hold.

use traymatch_core::{Axis, Cell, Color, ContainerId, ContainerShape, Footprint, ItemId};

/// A colored unit held by exactly one container.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Item {
    /// Identity, unique for the lifetime of the board.
    pub id: ItemId,
    /// Color.
    pub color: Color,
    /// The container currently holding the item.
    pub owner: ContainerId,
}

/// Mutable state bits of a container.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ContainerFlags {
    /// On the board and not yet finished.
    pub active: bool,
    /// Gated; never exchanges or moves until unlocked.
    pub locked: bool,
    /// Part of an in-flight exchange.
    pub swapping: bool,
    /// Completed and waiting to leave the board.
    pub finishing: bool,
    /// Seed of a running cascade session.
    pub cascading: bool,
}

/// A movable container on the board.
#[derive(Clone, Debug)]
pub struct Container {
    id: ContainerId,
    shape: ContainerShape,
    anchor: Cell,
    items: Vec<Item>,
    axis: Option<Axis>,
    unlock_threshold: Option<u32>,
    withheld: Vec<Color>,
    /// State bits.
    pub flags: ContainerFlags,
}

impl Container {
    /// A container at `anchor`, active and empty.
    pub fn new(id: ContainerId, shape: ContainerShape, anchor: Cell) -> Self {
        Self {
            id,
            shape,
            anchor,
            items: Vec::new(),
            axis: None,
            unlock_threshold: None,
            withheld: Vec::new(),
            flags: ContainerFlags {
                active: true,
                ..ContainerFlags::default()
            },
        }
    }

    /// Constrain movement to `axis`.
    pub fn with_axis(mut self, axis: Axis) -> Self {
        self.axis = Some(axis);
        self
    }

    /// Lock the container until `threshold` containers have finished.
    pub fn gated(mut self, threshold: u32) -> Self {
        self.unlock_threshold = Some(threshold);
        self.flags.locked = true;
        self
    }

    /// Identity.
    pub fn id(&self) -> ContainerId {
        self.id
    }

    /// Footprint and home color.
    pub fn shape(&self) -> &ContainerShape {
        &self.shape
    }

    /// Home color.
    pub fn home(&self) -> Color {
        self.shape.home()
    }

    /// Item slots.
    pub fn capacity(&self) -> usize {
        self.shape.capacity()
    }

    /// Lower-left footprint cell.
    pub fn anchor(&self) -> Cell {
        self.anchor
    }

    pub(crate) fn set_anchor(&mut self, anchor: Cell) {
        self.anchor = anchor;
    }

    /// Occupied grid cells at the current anchor.
    pub fn footprint(&self) -> Footprint {
        self.shape.footprint(self.anchor)
    }

    /// Movement constraint, if any.
    pub fn axis(&self) -> Option<Axis> {
        self.axis
    }

    /// Finish count that unlocks the container, if gated.
    pub fn unlock_threshold(&self) -> Option<u32> {
        self.unlock_threshold
    }

    /// Held items, in placement order.
    pub fn items(&self) -> &[Item] {
        &self.items
    }

    /// Colors of the held items, in placement order.
    pub fn colors(&self) -> Vec<Color> {
        self.items.iter().map(|i| i.color).collect()
    }

    /// Held items whose color differs from the home color.
    pub fn wrong_items(&self) -> impl Iterator<Item = &Item> + '_ {
        let home = self.home();
        self.items.iter().filter(move |i| i.color != home)
    }

    /// Number of held items not of the home color.
    pub fn wrong_count(&self) -> usize {
        self.wrong_items().count()
    }

    /// Whether at least one wrong item has color `color`.
    pub fn offers(&self, color: Color) -> bool {
        self.wrong_items().any(|i| i.color == color)
    }

    /// Non-empty and holding only home-colored items.
    pub fn is_complete(&self) -> bool {
        !self.items.is_empty() && self.items.iter().all(|i| i.color == self.home())
    }

    /// Whether exchanges may currently start on this container.
    pub fn can_exchange(&self) -> bool {
        let f = self.flags;
        f.active && !f.locked && !f.swapping && !f.finishing
    }

    /// Remove the held item `item`, if present.
    pub(crate) fn take_item(&mut self, item: ItemId) -> Option<Item> {
        let pos = self.items.iter().position(|i| i.id == item)?;
        Some(self.items.remove(pos))
    }

    /// Append `item`, taking ownership of it.
    pub(crate) fn put_item(&mut self, mut item: Item) {
        item.owner = self.id;
        self.items.push(item);
    }

    pub(crate) fn holds(&self, item: ItemId) -> bool {
        self.items.iter().any(|i| i.id == item)
    }

    /// Store planned content to hand out later.
    pub(crate) fn withhold(&mut self, colors: Vec<Color>) {
        self.withheld = colors;
    }

    pub(crate) fn take_withheld(&mut self) -> Vec<Color> {
        std::mem::take(&mut self.withheld)
    }

    /// Planned content not yet dispensed.
    pub fn withheld(&self) -> &[Color] {
        &self.withheld
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: u64, color: Color, owner: u32) -> Item {
        Item {
            id: ItemId(id),
            color,
            owner: ContainerId(owner),
        }
    }

    fn red_tray() -> Container {
        let shape = ContainerShape::new(1, 1, Color::Red).unwrap();
        Container::new(ContainerId(1), shape, Cell::ZERO)
    }

    #[test]
    fn empty_container_is_not_complete() {
        assert!(!red_tray().is_complete());
    }

    #[test]
    fn completion_requires_only_home_items() {
        let mut c = red_tray();
        c.put_item(item(1, Color::Red, 1));
        c.put_item(item(2, Color::Blue, 1));
        assert!(!c.is_complete());
        assert_eq!(c.wrong_count(), 1);
        assert!(c.offers(Color::Blue));
        c.take_item(ItemId(2)).unwrap();
        assert!(c.is_complete());
    }

    #[test]
    fn put_item_rewrites_owner() {
        let mut c = red_tray();
        c.put_item(item(7, Color::Green, 9));
        assert_eq!(c.items()[0].owner, ContainerId(1));
    }

    #[test]
    fn gated_container_cannot_exchange() {
        let c = red_tray().gated(2);
        assert!(c.flags.locked);
        assert_eq!(c.unlock_threshold(), Some(2));
        assert!(!c.can_exchange());
    }
}
