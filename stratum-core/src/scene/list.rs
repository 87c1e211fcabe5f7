//! Scene arena and list linkage

use heapless::Vec;

use super::{ActionEvent, ActionKind, DamageSink, VisHandle, Widget};
use crate::color::Color;
use crate::error::{Error, Result};
use crate::geometry::Rect;

/// Handle of the root list
pub const ROOT: VisHandle = VisHandle::new(0, 0);

/// Node content
#[derive(Debug)]
enum Body<W> {
    Widget(W),
    List {
        head: Option<u16>,
        tail: Option<u16>,
    },
}

#[derive(Debug)]
struct Node<W> {
    generation: u16,
    body: Body<W>,
    /// Area relative to the owning list origin
    area: Rect,
    z: u32,
    active: bool,
    /// Owning list (assigned even while detached)
    list: u16,
    linked: bool,
    prev: Option<u16>,
    next: Option<u16>,
}

#[derive(Debug)]
enum Slot<W> {
    Vacant { generation: u16 },
    Occupied(Node<W>),
}

/// Arena of visual objects with z-ordered, nestable lists
///
/// Holds at most `N` nodes, the root list included.
pub struct Scene<W, const N: usize> {
    slots: Vec<Slot<W>, N>,
}

impl<W: Widget, const N: usize> Scene<W, N> {
    /// Create a scene whose root list covers `width` x `height`
    pub fn new(width: i32, height: i32) -> Self {
        let mut slots = Vec::new();
        let root = Node {
            generation: 0,
            body: Body::List {
                head: None,
                tail: None,
            },
            area: Rect::from_size(0, 0, width, height),
            z: 0,
            active: true,
            list: 0,
            linked: false,
            prev: None,
            next: None,
        };
        // N == 0 leaves a scene without a root; every call then fails
        let _ = slots.push(Slot::Occupied(root));
        Self { slots }
    }

    /// Root list handle
    pub const fn root(&self) -> VisHandle {
        ROOT
    }

    /// Resize the root list (screen rotation)
    pub fn resize_root(&mut self, width: i32, height: i32) {
        if let Ok(root) = self.node_mut(0) {
            root.area = Rect::from_size(0, 0, width, height);
        }
    }

    /// Add a detached widget at `(x, y)`, sized by [`Widget::size`]
    ///
    /// The object belongs to the root list until [`Scene::set_list`] says
    /// otherwise.
    pub fn add(&mut self, widget: W, x: i32, y: i32) -> Result<VisHandle> {
        let (width, height) = widget.size();
        self.insert(Body::Widget(widget), Rect::from_size(x, y, width, height))
    }

    /// Add a detached, empty list covering the given area
    pub fn add_list(&mut self, x: i32, y: i32, width: i32, height: i32) -> Result<VisHandle> {
        self.insert(
            Body::List {
                head: None,
                tail: None,
            },
            Rect::from_size(x, y, width, height),
        )
    }

    fn insert(&mut self, body: Body<W>, area: Rect) -> Result<VisHandle> {
        let vacant = self
            .slots
            .iter()
            .position(|slot| matches!(slot, Slot::Vacant { .. }));

        let (index, generation) = match vacant {
            Some(index) => match self.slots[index] {
                Slot::Vacant { generation } => (index, generation),
                Slot::Occupied(_) => return Err(Error::InvalidItem),
            },
            None => {
                self.slots
                    .push(Slot::Vacant { generation: 0 })
                    .map_err(|_| Error::Overflow)?;
                (self.slots.len() - 1, 0)
            }
        };

        self.slots[index] = Slot::Occupied(Node {
            generation,
            body,
            area,
            z: 0,
            active: true,
            list: 0,
            linked: false,
            prev: None,
            next: None,
        });
        Ok(VisHandle::new(index as u16, generation))
    }

    /// Remove a widget, hiding it first, and hand it back
    pub fn remove(&mut self, obj: VisHandle, sink: &mut impl DamageSink) -> Result<W> {
        let index = self.resolve(obj)?;
        if self.is_list(index) {
            return Err(Error::BadParameter);
        }
        match self.release(index, sink)? {
            Body::Widget(widget) => Ok(widget),
            Body::List { .. } => Err(Error::InvalidItem),
        }
    }

    /// Remove a list created with [`Scene::add_list`]
    ///
    /// Members are detached and fall back to the root list.
    pub fn remove_list(&mut self, list: VisHandle, sink: &mut impl DamageSink) -> Result<()> {
        let index = self.resolve(list)?;
        if index == 0 || !self.is_list(index) {
            return Err(Error::BadParameter);
        }
        if let Body::List { head, .. } = self.node(index)?.body {
            let mut cur = head;
            while let Some(child) = cur {
                cur = self.node(child)?.next;
                self.unlink(child)?;
            }
        }
        // Detached members assigned to the list fall back too
        for slot in self.slots.iter_mut() {
            if let Slot::Occupied(node) = slot {
                if node.list == index {
                    node.list = 0;
                }
            }
        }
        self.release(index, sink).map(|_| ())
    }

    fn release(&mut self, index: u16, sink: &mut impl DamageSink) -> Result<Body<W>> {
        if self.node(index)?.linked {
            sink.invalidate(self.absolute_area(index)?);
            self.unlink(index)?;
        }
        let generation = self.node(index)?.generation.wrapping_add(1);
        let slot = core::mem::replace(
            &mut self.slots[index as usize],
            Slot::Vacant { generation },
        );
        match slot {
            Slot::Occupied(node) => Ok(node.body),
            Slot::Vacant { .. } => Err(Error::NullPointer),
        }
    }

    /// Choose the list the object will be shown in
    ///
    /// Only allowed while the object is detached.
    pub fn set_list(&mut self, obj: VisHandle, list: VisHandle) -> Result<()> {
        let index = self.resolve(obj)?;
        let list = self.resolve(list)?;
        if self.node(index)?.linked || !self.is_list(list) {
            return Err(Error::BadParameter);
        }
        if self.creates_cycle(list, index)? {
            return Err(Error::BadParameter);
        }
        self.node_mut(index)?.list = list;
        Ok(())
    }

    /// Attach the object to its list at depth `z`
    ///
    /// `z == 0` keeps the depth the object last had. Among equal depths the
    /// newest object is drawn last (on top). Showing an object that is
    /// already shown re-inserts it at the new depth.
    pub fn show(&mut self, obj: VisHandle, z: u32, sink: &mut impl DamageSink) -> Result<()> {
        let index = self.resolve(obj)?;
        if index == 0 {
            return Err(Error::BadParameter);
        }
        if self.node(index)?.linked {
            self.unlink(index)?;
        }
        if z != 0 {
            self.node_mut(index)?.z = z;
        }
        let list = self.node(index)?.list;
        self.link(list, index)?;
        // Not drawn yet, but the area it is about to cover must be
        sink.invalidate(self.absolute_area(index)?);
        Ok(())
    }

    /// Detach the object, invalidating the area it covered
    pub fn hide(&mut self, obj: VisHandle, sink: &mut impl DamageSink) -> Result<()> {
        let index = self.resolve(obj)?;
        if !self.node(index)?.linked {
            return Err(Error::InvalidItem);
        }
        sink.invalidate(self.absolute_area(index)?);
        self.unlink(index)
    }

    /// Move the object to `(x, y)`, or by `(x, y)` when `delta` is set
    ///
    /// Both the old and the new area are invalidated. Moving to the current
    /// position does nothing.
    pub fn move_to(
        &mut self,
        obj: VisHandle,
        x: i32,
        y: i32,
        delta: bool,
        sink: &mut impl DamageSink,
    ) -> Result<()> {
        let index = self.resolve(obj)?;
        let area = self.node(index)?.area;
        let (dx, dy) = if delta {
            (x, y)
        } else {
            (x - area.x_start, y - area.y_start)
        };
        if dx == 0 && dy == 0 {
            return Ok(());
        }

        let shown = self.node(index)?.linked;
        if shown {
            sink.invalidate(self.absolute_area(index)?);
        }
        self.node_mut(index)?.area = area.translate(dx, dy);
        if shown {
            sink.invalidate(self.absolute_area(index)?);
        }
        Ok(())
    }

    /// Mutate a widget and redraw it
    ///
    /// The area is re-sized from [`Widget::size`] keeping its origin.
    pub fn update<R>(
        &mut self,
        obj: VisHandle,
        sink: &mut impl DamageSink,
        f: impl FnOnce(&mut W) -> R,
    ) -> Result<R> {
        let index = self.resolve(obj)?;
        let before = self.absolute_area(index)?;
        let node = self.node_mut(index)?;
        let Body::Widget(widget) = &mut node.body else {
            return Err(Error::BadParameter);
        };
        let result = f(widget);
        let (width, height) = widget.size();
        node.area = Rect::from_size(node.area.x_start, node.area.y_start, width, height);
        let shown = node.linked;

        if shown {
            let after = self.absolute_area(index)?;
            sink.invalidate(before);
            if after != before {
                sink.invalidate(after);
            }
        }
        Ok(result)
    }

    /// Resize a list
    pub fn resize_list(
        &mut self,
        list: VisHandle,
        width: i32,
        height: i32,
        sink: &mut impl DamageSink,
    ) -> Result<()> {
        let index = self.resolve(list)?;
        if !self.is_list(index) {
            return Err(Error::BadParameter);
        }
        let before = self.absolute_area(index)?;
        let node = self.node_mut(index)?;
        node.area = Rect::from_size(node.area.x_start, node.area.y_start, width, height);
        if node.linked {
            let after = self.absolute_area(index)?;
            sink.invalidate(before.union(&after));
        }
        Ok(())
    }

    /// Enable or disable gesture delivery to the object
    pub fn set_active(&mut self, obj: VisHandle, active: bool) -> Result<()> {
        let index = self.resolve(obj)?;
        self.node_mut(index)?.active = active;
        Ok(())
    }

    pub fn is_active(&self, obj: VisHandle) -> Result<bool> {
        Ok(self.node(self.resolve(obj)?)?.active)
    }

    /// Object is attached to a list
    pub fn is_shown(&self, obj: VisHandle) -> Result<bool> {
        Ok(self.node(self.resolve(obj)?)?.linked)
    }

    /// Depth the object was last shown at
    pub fn z(&self, obj: VisHandle) -> Result<u32> {
        Ok(self.node(self.resolve(obj)?)?.z)
    }

    /// Area relative to the owning list
    pub fn area(&self, obj: VisHandle) -> Result<Rect> {
        Ok(self.node(self.resolve(obj)?)?.area)
    }

    /// Area in screen coordinates
    pub fn screen_area(&self, obj: VisHandle) -> Result<Rect> {
        self.absolute_area(self.resolve(obj)?)
    }

    /// Borrow a widget
    pub fn get(&self, obj: VisHandle) -> Option<&W> {
        let index = self.resolve(obj).ok()?;
        match &self.node(index).ok()?.body {
            Body::Widget(widget) => Some(widget),
            Body::List { .. } => None,
        }
    }

    /// Borrow a widget mutably
    ///
    /// Nothing is invalidated; use [`Scene::update`] for visible changes.
    pub fn get_mut(&mut self, obj: VisHandle) -> Option<&mut W> {
        let index = self.resolve(obj).ok()?;
        match &mut self.node_mut(index).ok()?.body {
            Body::Widget(widget) => Some(widget),
            Body::List { .. } => None,
        }
    }

    /// Members of a list in drawing order (bottom first)
    pub fn members(&self, list: VisHandle) -> Members<'_, W, N> {
        let next = self
            .resolve(list)
            .ok()
            .and_then(|index| match self.node(index) {
                Ok(Node {
                    body: Body::List { head, .. },
                    ..
                }) => *head,
                _ => None,
            });
        Members { scene: self, next }
    }

    /// Render one row of the screen
    ///
    /// `buf[0]` is the pixel at column `start_x` of screen line `line`.
    pub fn draw_in_buf_w(&self, buf: &mut [Color], line: i32, start_x: i32) {
        self.draw_list_w(0, buf, line, start_x);
    }

    /// Render one column of the screen
    ///
    /// `buf[0]` is the pixel at line `start_y` of screen column `row`.
    pub fn draw_in_buf_h(&self, buf: &mut [Color], row: i32, start_y: i32) {
        self.draw_list_h(0, buf, row, start_y);
    }

    fn draw_list_w(&self, list: u16, buf: &mut [Color], line: i32, start_x: i32) {
        let Ok(node) = self.node(list) else {
            return;
        };
        let Body::List { head, .. } = node.body else {
            return;
        };
        if line < node.area.y_start || line > node.area.y_end {
            return;
        }
        // Members are clipped to the list area
        let Some(span) = node.area.span_x(start_x, buf.len()) else {
            return;
        };
        let buf = &mut buf[(*span.start() - start_x) as usize..=(*span.end() - start_x) as usize];
        let line = line - node.area.y_start;
        let start_x = *span.start() - node.area.x_start;

        let mut cur = head;
        while let Some(index) = cur {
            let Ok(child) = self.node(index) else {
                return;
            };
            cur = child.next;
            if line < child.area.y_start || line > child.area.y_end {
                continue;
            }
            if child.area.span_x(start_x, buf.len()).is_none() {
                continue;
            }
            match &child.body {
                Body::Widget(widget) => widget.draw_in_buf_w(&child.area, buf, line, start_x),
                Body::List { .. } => self.draw_list_w(index, buf, line, start_x),
            }
        }
    }

    fn draw_list_h(&self, list: u16, buf: &mut [Color], row: i32, start_y: i32) {
        let Ok(node) = self.node(list) else {
            return;
        };
        let Body::List { head, .. } = node.body else {
            return;
        };
        if row < node.area.x_start || row > node.area.x_end {
            return;
        }
        let Some(span) = node.area.span_y(start_y, buf.len()) else {
            return;
        };
        let buf = &mut buf[(*span.start() - start_y) as usize..=(*span.end() - start_y) as usize];
        let row = row - node.area.x_start;
        let start_y = *span.start() - node.area.y_start;

        let mut cur = head;
        while let Some(index) = cur {
            let Ok(child) = self.node(index) else {
                return;
            };
            cur = child.next;
            if row < child.area.x_start || row > child.area.x_end {
                continue;
            }
            if child.area.span_y(start_y, buf.len()).is_none() {
                continue;
            }
            match &child.body {
                Body::Widget(widget) => widget.draw_in_buf_h(&child.area, buf, row, start_y),
                Body::List { .. } => self.draw_list_h(index, buf, row, start_y),
            }
        }
    }

    /// Deliver a gesture in screen coordinates
    ///
    /// `Touch` and `Untouch` go to the topmost active object under the
    /// point only. `Move` and `Hold` go to the topmost active object that
    /// contains both points; objects the finger left or entered on the way
    /// get `MoveOut` / `MoveIn`. Returns the object that received the
    /// gesture itself, if any.
    pub fn action(
        &mut self,
        kind: ActionKind,
        x: i32,
        y: i32,
        prev_x: i32,
        prev_y: i32,
        sink: &mut impl DamageSink,
    ) -> Option<VisHandle> {
        let event = ActionEvent {
            kind,
            x,
            y,
            prev_x,
            prev_y,
        };
        self.action_list(0, event, sink)
    }

    fn action_list(
        &mut self,
        list: u16,
        event: ActionEvent,
        sink: &mut impl DamageSink,
    ) -> Option<VisHandle> {
        let node = self.node(list).ok()?;
        let Body::List { tail, .. } = node.body else {
            return None;
        };
        let origin = node.area;
        let event = ActionEvent {
            x: event.x - origin.x_start,
            y: event.y - origin.y_start,
            prev_x: event.prev_x - origin.x_start,
            prev_y: event.prev_y - origin.y_start,
            ..event
        };

        let mut cur = tail;
        match event.kind {
            ActionKind::Touch | ActionKind::Untouch => {
                while let Some(index) = cur {
                    let child = self.node(index).ok()?;
                    cur = child.prev;
                    if child.active && child.area.contains(event.x, event.y) {
                        return self.deliver(index, event, sink);
                    }
                }
                None
            }
            ActionKind::Move | ActionKind::Hold | ActionKind::MoveIn | ActionKind::MoveOut => {
                while let Some(index) = cur {
                    let child = self.node(index).ok()?;
                    cur = child.prev;
                    if !child.active {
                        continue;
                    }
                    let now_in = child.area.contains(event.x, event.y);
                    let was_in = child.area.contains(event.prev_x, event.prev_y);
                    let is_list = matches!(child.body, Body::List { .. });

                    if now_in && was_in {
                        return self.deliver(index, event, sink);
                    } else if was_in {
                        let kind = if is_list { event.kind } else { ActionKind::MoveOut };
                        self.deliver(index, ActionEvent { kind, ..event }, sink);
                    } else if now_in {
                        let kind = if is_list { event.kind } else { ActionKind::MoveIn };
                        self.deliver(index, ActionEvent { kind, ..event }, sink);
                    }
                }
                None
            }
        }
    }

    fn deliver(
        &mut self,
        index: u16,
        event: ActionEvent,
        sink: &mut impl DamageSink,
    ) -> Option<VisHandle> {
        if self.is_list(index) {
            return self.action_list(index, event, sink);
        }
        let node = self.node_mut(index).ok()?;
        let handle = VisHandle::new(index, node.generation);
        let area = node.area;
        let Body::Widget(widget) = &mut node.body else {
            return None;
        };
        if widget.action(&area, &event) {
            if let Ok(area) = self.absolute_area(index) {
                sink.invalidate(area);
            }
        }
        Some(handle)
    }

    /// Insert `obj` into `list` keeping z order (newest last among equals)
    fn link(&mut self, list: u16, obj: u16) -> Result<()> {
        let node = self.node(obj)?;
        if node.linked {
            return Err(Error::BadParameter);
        }
        let z = node.z;
        let Body::List { head, tail } = self.node(list)?.body else {
            return Err(Error::BadParameter);
        };
        if self.creates_cycle(list, obj)? {
            return Err(Error::BadParameter);
        }

        // First member drawn above the new object
        let mut before = head;
        while let Some(index) = before {
            let member = self.node(index)?;
            if member.z > z {
                break;
            }
            before = member.next;
        }

        let prev = match before {
            Some(index) => self.node(index)?.prev,
            None => tail,
        };

        {
            let node = self.node_mut(obj)?;
            node.prev = prev;
            node.next = before;
            node.list = list;
            node.linked = true;
        }
        match prev {
            Some(index) => self.node_mut(index)?.next = Some(obj),
            None => self.set_head(list, Some(obj))?,
        }
        match before {
            Some(index) => self.node_mut(index)?.prev = Some(obj),
            None => self.set_tail(list, Some(obj))?,
        }
        Ok(())
    }

    /// Remove `obj` from the list it is linked into
    fn unlink(&mut self, obj: u16) -> Result<()> {
        let node = self.node(obj)?;
        if !node.linked {
            return Err(Error::InvalidItem);
        }
        let (prev, next, list) = (node.prev, node.next, node.list);

        match prev {
            Some(index) => self.node_mut(index)?.next = next,
            None => self.set_head(list, next)?,
        }
        match next {
            Some(index) => self.node_mut(index)?.prev = prev,
            None => self.set_tail(list, prev)?,
        }

        let node = self.node_mut(obj)?;
        node.prev = None;
        node.next = None;
        node.linked = false;
        Ok(())
    }

    fn set_head(&mut self, list: u16, value: Option<u16>) -> Result<()> {
        match &mut self.node_mut(list)?.body {
            Body::List { head, .. } => {
                *head = value;
                Ok(())
            }
            Body::Widget(_) => Err(Error::BadParameter),
        }
    }

    fn set_tail(&mut self, list: u16, value: Option<u16>) -> Result<()> {
        match &mut self.node_mut(list)?.body {
            Body::List { tail, .. } => {
                *tail = value;
                Ok(())
            }
            Body::Widget(_) => Err(Error::BadParameter),
        }
    }

    /// Placing `obj` in `list` would make a list contain itself
    fn creates_cycle(&self, list: u16, obj: u16) -> Result<bool> {
        let mut cur = list;
        loop {
            if cur == obj {
                return Ok(true);
            }
            if cur == 0 {
                return Ok(false);
            }
            cur = self.node(cur)?.list;
        }
    }

    fn is_list(&self, index: u16) -> bool {
        matches!(
            self.node(index),
            Ok(Node {
                body: Body::List { .. },
                ..
            })
        )
    }

    fn absolute_area(&self, index: u16) -> Result<Rect> {
        let node = self.node(index)?;
        let mut area = node.area;
        if index == 0 {
            return Ok(area);
        }
        let mut list = node.list;
        loop {
            let owner = self.node(list)?;
            area = area.translate(owner.area.x_start, owner.area.y_start);
            if list == 0 {
                return Ok(area);
            }
            list = owner.list;
        }
    }

    fn resolve(&self, handle: VisHandle) -> Result<u16> {
        match self.slots.get(handle.index as usize) {
            Some(Slot::Occupied(node)) if node.generation == handle.generation => Ok(handle.index),
            _ => Err(Error::NullPointer),
        }
    }

    fn node(&self, index: u16) -> Result<&Node<W>> {
        match self.slots.get(index as usize) {
            Some(Slot::Occupied(node)) => Ok(node),
            _ => Err(Error::NullPointer),
        }
    }

    fn node_mut(&mut self, index: u16) -> Result<&mut Node<W>> {
        match self.slots.get_mut(index as usize) {
            Some(Slot::Occupied(node)) => Ok(node),
            _ => Err(Error::NullPointer),
        }
    }
}

/// Iterator over list members in drawing order
pub struct Members<'a, W, const N: usize> {
    scene: &'a Scene<W, N>,
    next: Option<u16>,
}

impl<'a, W: Widget, const N: usize> Iterator for Members<'a, W, N> {
    type Item = VisHandle;

    fn next(&mut self) -> Option<VisHandle> {
        let index = self.next?;
        let node = self.scene.node(index).ok()?;
        self.next = node.next;
        Some(VisHandle::new(index, node.generation))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::PixelFormat;
    use core::cell::Cell;

    /// Solid block that counts the gestures it receives
    struct Block {
        width: i32,
        height: i32,
        color: Color,
        touches: Cell<u32>,
        last: Cell<Option<ActionKind>>,
        draws: Cell<u32>,
    }

    impl Block {
        fn new(width: i32, height: i32, color: Color) -> Self {
            Self {
                width,
                height,
                color,
                touches: Cell::new(0),
                last: Cell::new(None),
                draws: Cell::new(0),
            }
        }
    }

    impl Widget for Block {
        fn size(&self) -> (i32, i32) {
            (self.width, self.height)
        }

        fn draw_in_buf_w(&self, area: &Rect, buf: &mut [Color], _line: i32, start_x: i32) {
            self.draws.set(self.draws.get() + 1);
            if let Some(span) = area.span_x(start_x, buf.len()) {
                for x in span {
                    buf[(x - start_x) as usize] = self.color;
                }
            }
        }

        fn draw_in_buf_h(&self, area: &Rect, buf: &mut [Color], _row: i32, start_y: i32) {
            if let Some(span) = area.span_y(start_y, buf.len()) {
                for y in span {
                    buf[(y - start_y) as usize] = self.color;
                }
            }
        }

        fn action(&mut self, _area: &Rect, event: &ActionEvent) -> bool {
            self.touches.set(self.touches.get() + 1);
            self.last.set(Some(event.kind));
            event.kind == ActionKind::Touch
        }
    }

    type TestScene = Scene<Block, 16>;
    type Damage = heapless::Vec<Rect, 32>;

    fn members(scene: &TestScene, list: VisHandle) -> heapless::Vec<VisHandle, 16> {
        scene.members(list).collect()
    }

    #[test]
    fn test_show_orders_by_z_newest_last() {
        let mut scene = TestScene::new(320, 240);
        let mut damage = Damage::new();

        let a = scene.add(Block::new(5, 5, Color::RED), 0, 0).unwrap();
        let b = scene.add(Block::new(5, 5, Color::RED), 0, 0).unwrap();
        let c = scene.add(Block::new(5, 5, Color::RED), 0, 0).unwrap();
        let d = scene.add(Block::new(5, 5, Color::RED), 0, 0).unwrap();

        scene.show(a, 2, &mut damage).unwrap();
        scene.show(b, 1, &mut damage).unwrap();
        scene.show(c, 2, &mut damage).unwrap();
        scene.show(d, 1, &mut damage).unwrap();

        assert_eq!(members(&scene, ROOT).as_slice(), &[b, d, a, c]);
    }

    #[test]
    fn test_show_invalidates_area() {
        let mut scene = TestScene::new(320, 240);
        let mut damage = Damage::new();
        let a = scene.add(Block::new(10, 10, Color::RED), 5, 6).unwrap();

        scene.show(a, 1, &mut damage).unwrap();
        assert_eq!(damage.as_slice(), &[Rect::new(5, 6, 14, 15)]);
        assert!(scene.is_shown(a).unwrap());
    }

    #[test]
    fn test_show_zero_keeps_previous_depth() {
        let mut scene = TestScene::new(320, 240);
        let mut damage = Damage::new();
        let a = scene.add(Block::new(5, 5, Color::RED), 0, 0).unwrap();
        let b = scene.add(Block::new(5, 5, Color::RED), 0, 0).unwrap();

        scene.show(a, 7, &mut damage).unwrap();
        scene.show(b, 3, &mut damage).unwrap();
        scene.hide(a, &mut damage).unwrap();
        scene.show(a, 0, &mut damage).unwrap();

        assert_eq!(scene.z(a).unwrap(), 7);
        assert_eq!(members(&scene, ROOT).as_slice(), &[b, a]);
    }

    #[test]
    fn test_hide_unlinks_head_middle_tail() {
        let mut scene = TestScene::new(320, 240);
        let mut damage = Damage::new();
        let handles: heapless::Vec<VisHandle, 4> = (0..4)
            .map(|i| {
                let h = scene.add(Block::new(5, 5, Color::RED), 0, 0).unwrap();
                scene.show(h, i + 1, &mut damage).unwrap();
                h
            })
            .collect();

        scene.hide(handles[1], &mut damage).unwrap();
        assert_eq!(
            members(&scene, ROOT).as_slice(),
            &[handles[0], handles[2], handles[3]]
        );
        scene.hide(handles[0], &mut damage).unwrap();
        assert_eq!(members(&scene, ROOT).as_slice(), &[handles[2], handles[3]]);
        scene.hide(handles[3], &mut damage).unwrap();
        assert_eq!(members(&scene, ROOT).as_slice(), &[handles[2]]);
        scene.hide(handles[2], &mut damage).unwrap();
        assert!(members(&scene, ROOT).is_empty());
    }

    #[test]
    fn test_hide_detached_fails() {
        let mut scene = TestScene::new(320, 240);
        let mut damage = Damage::new();
        let a = scene.add(Block::new(5, 5, Color::RED), 0, 0).unwrap();
        assert_eq!(scene.hide(a, &mut damage), Err(Error::InvalidItem));
        assert!(damage.is_empty());
    }

    #[test]
    fn test_stale_handle_rejected() {
        let mut scene = TestScene::new(320, 240);
        let mut damage = Damage::new();
        let a = scene.add(Block::new(5, 5, Color::RED), 0, 0).unwrap();
        scene.remove(a, &mut damage).unwrap();

        let b = scene.add(Block::new(5, 5, Color::RED), 0, 0).unwrap();
        assert_eq!(a.index(), b.index());
        assert_eq!(scene.show(a, 1, &mut damage), Err(Error::NullPointer));
        assert!(scene.show(b, 1, &mut damage).is_ok());
    }

    #[test]
    fn test_remove_forces_hide() {
        let mut scene = TestScene::new(320, 240);
        let mut damage = Damage::new();
        let a = scene.add(Block::new(4, 4, Color::RED), 1, 1).unwrap();
        scene.show(a, 1, &mut damage).unwrap();
        damage.clear();

        let block = scene.remove(a, &mut damage).unwrap();
        assert_eq!(block.width, 4);
        assert_eq!(damage.as_slice(), &[Rect::new(1, 1, 4, 4)]);
        assert!(members(&scene, ROOT).is_empty());
    }

    #[test]
    fn test_move_to_same_position_is_silent() {
        let mut scene = TestScene::new(320, 240);
        let mut damage = Damage::new();
        let a = scene.add(Block::new(5, 5, Color::RED), 10, 10).unwrap();
        scene.show(a, 1, &mut damage).unwrap();
        damage.clear();

        scene.move_to(a, 10, 10, false, &mut damage).unwrap();
        scene.move_to(a, 0, 0, true, &mut damage).unwrap();
        assert!(damage.is_empty());
    }

    #[test]
    fn test_move_invalidates_old_and_new() {
        let mut scene = TestScene::new(320, 240);
        let mut damage = Damage::new();
        let a = scene.add(Block::new(5, 5, Color::RED), 10, 10).unwrap();
        scene.show(a, 1, &mut damage).unwrap();
        damage.clear();

        scene.move_to(a, 2, -3, true, &mut damage).unwrap();
        assert_eq!(
            damage.as_slice(),
            &[Rect::new(10, 10, 14, 14), Rect::new(12, 7, 16, 11)]
        );
        assert_eq!(scene.area(a).unwrap(), Rect::new(12, 7, 16, 11));
    }

    #[test]
    fn test_update_resizes_and_invalidates() {
        let mut scene = TestScene::new(320, 240);
        let mut damage = Damage::new();
        let a = scene.add(Block::new(5, 5, Color::RED), 0, 0).unwrap();
        scene.show(a, 1, &mut damage).unwrap();
        damage.clear();

        scene.update(a, &mut damage, |p| p.width = 8).unwrap();
        assert_eq!(scene.area(a).unwrap(), Rect::new(0, 0, 7, 4));
        assert_eq!(
            damage.as_slice(),
            &[Rect::new(0, 0, 4, 4), Rect::new(0, 0, 7, 4)]
        );
    }

    #[test]
    fn test_draw_respects_z_order() {
        let mut scene = TestScene::new(32, 32);
        let mut damage = Damage::new();
        let low = scene.add(Block::new(10, 10, Color::RED), 0, 0).unwrap();
        let high = scene.add(Block::new(10, 10, Color::BLUE), 5, 5).unwrap();
        scene.show(high, 2, &mut damage).unwrap();
        scene.show(low, 1, &mut damage).unwrap();

        let mut buf = [Color::BLACK; 15];
        scene.draw_in_buf_w(&mut buf, 7, 0);
        assert!(buf[..5].iter().all(|&c| c == Color::RED));
        assert!(buf[5..15].iter().all(|&c| c == Color::BLUE));

        let mut buf = [Color::BLACK; 15];
        scene.draw_in_buf_w(&mut buf, 2, 0);
        assert!(buf[..10].iter().all(|&c| c == Color::RED));
        assert!(buf[10..].iter().all(|&c| c == Color::BLACK));
    }

    #[test]
    fn test_draw_skips_objects_off_the_line() {
        let mut scene = TestScene::new(32, 32);
        let mut damage = Damage::new();
        let a = scene.add(Block::new(4, 4, Color::RED), 0, 10).unwrap();
        scene.show(a, 1, &mut damage).unwrap();

        let mut buf = [Color::BLACK; 32];
        scene.draw_in_buf_w(&mut buf, 5, 0);
        assert_eq!(scene.get(a).unwrap().draws.get(), 0);
        scene.draw_in_buf_w(&mut buf, 11, 0);
        assert_eq!(scene.get(a).unwrap().draws.get(), 1);
    }

    #[test]
    fn test_draw_columns() {
        let mut scene = TestScene::new(32, 32);
        let mut damage = Damage::new();
        let a = scene.add(Block::new(2, 6, Color::GREEN), 4, 3).unwrap();
        scene.show(a, 1, &mut damage).unwrap();

        let mut buf = [Color::BLACK; 12];
        scene.draw_in_buf_h(&mut buf, 5, 0);
        assert!(buf[..3].iter().all(|&c| c == Color::BLACK));
        assert!(buf[3..9].iter().all(|&c| c == Color::GREEN));
        assert!(buf[9..].iter().all(|&c| c == Color::BLACK));
    }

    #[test]
    fn test_nested_list_translates_coordinates() {
        let mut scene = TestScene::new(64, 64);
        let mut damage = Damage::new();
        let group = scene.add_list(20, 10, 30, 30).unwrap();
        let inner = scene.add(Block::new(4, 4, Color::RED), 2, 3).unwrap();
        scene.set_list(inner, group).unwrap();
        scene.show(inner, 1, &mut damage).unwrap();
        scene.show(group, 1, &mut damage).unwrap();

        assert_eq!(scene.screen_area(inner).unwrap(), Rect::new(22, 13, 25, 16));

        let mut buf = [Color::BLACK; 64];
        scene.draw_in_buf_w(&mut buf, 14, 0);
        assert!(buf[22..26].iter().all(|&c| c == Color::RED));
        assert_eq!(buf[21], Color::BLACK);
        assert_eq!(buf[26], Color::BLACK);

        // Touch in screen coordinates reaches the nested object
        let hit = scene.action(ActionKind::Touch, 23, 14, 23, 14, &mut damage);
        assert_eq!(hit, Some(inner));
    }

    #[test]
    fn test_list_clips_overhanging_member() {
        let mut scene = TestScene::new(32, 32);
        let mut damage = Damage::new();
        let group = scene.add_list(4, 2, 10, 10).unwrap();
        let big = scene.add(Block::new(20, 20, Color::RED), -2, 0).unwrap();
        scene.set_list(big, group).unwrap();
        scene.show(big, 1, &mut damage).unwrap();
        scene.show(group, 1, &mut damage).unwrap();

        let mut buf = [Color::BLACK; 32];
        scene.draw_in_buf_w(&mut buf, 5, 0);
        assert!(buf[..4].iter().all(|&c| c == Color::BLACK));
        assert!(buf[4..14].iter().all(|&c| c == Color::RED));
        assert!(buf[14..].iter().all(|&c| c == Color::BLACK));

        let mut buf = [Color::BLACK; 32];
        scene.draw_in_buf_w(&mut buf, 15, 0);
        assert!(buf.iter().all(|&c| c == Color::BLACK));

        let mut col = [Color::BLACK; 32];
        scene.draw_in_buf_h(&mut col, 5, 0);
        assert!(col[..2].iter().all(|&c| c == Color::BLACK));
        assert!(col[2..12].iter().all(|&c| c == Color::RED));
        assert!(col[12..].iter().all(|&c| c == Color::BLACK));

        // Hit testing agrees with what is drawn
        assert_eq!(
            scene.action(ActionKind::Touch, 18, 5, 18, 5, &mut damage),
            None
        );
        assert_eq!(
            scene.action(ActionKind::Touch, 6, 5, 6, 5, &mut damage),
            Some(big)
        );

        // Hiding the list covers every pixel it drew
        damage.clear();
        scene.hide(group, &mut damage).unwrap();
        assert_eq!(damage.as_slice(), &[Rect::new(4, 2, 13, 11)]);
    }

    #[test]
    fn test_remove_list_resets_detached_members() {
        let mut scene = TestScene::new(64, 64);
        let mut damage = Damage::new();
        let group = scene.add_list(0, 0, 20, 20).unwrap();
        let obj = scene.add(Block::new(2, 2, Color::RED), 0, 0).unwrap();
        scene.set_list(obj, group).unwrap();
        scene.remove_list(group, &mut damage).unwrap();

        // The new list takes over the freed slot
        let other = scene.add_list(40, 40, 10, 10).unwrap();
        assert_eq!(other.index(), group.index());

        scene.show(obj, 1, &mut damage).unwrap();
        assert_eq!(members(&scene, ROOT).as_slice(), &[obj]);
        assert!(members(&scene, other).is_empty());
        assert_eq!(scene.screen_area(obj).unwrap(), Rect::new(0, 0, 1, 1));
    }

    #[test]
    fn test_list_cannot_contain_itself() {
        let mut scene = TestScene::new(64, 64);
        let outer = scene.add_list(0, 0, 30, 30).unwrap();
        let inner = scene.add_list(0, 0, 10, 10).unwrap();
        scene.set_list(inner, outer).unwrap();
        assert_eq!(scene.set_list(outer, inner), Err(Error::BadParameter));
        assert_eq!(scene.set_list(outer, outer), Err(Error::BadParameter));
    }

    #[test]
    fn test_touch_hits_topmost_only() {
        let mut scene = TestScene::new(64, 64);
        let mut damage = Damage::new();
        let z1 = scene.add(Block::new(20, 20, Color::RED), 0, 0).unwrap();
        let z2 = scene.add(Block::new(20, 20, Color::RED), 5, 5).unwrap();
        let z3 = scene.add(Block::new(20, 20, Color::RED), 10, 10).unwrap();
        scene.show(z3, 3, &mut damage).unwrap();
        scene.show(z1, 1, &mut damage).unwrap();
        scene.show(z2, 2, &mut damage).unwrap();
        damage.clear();

        let hit = scene.action(ActionKind::Touch, 15, 15, 15, 15, &mut damage);
        assert_eq!(hit, Some(z3));
        assert_eq!(scene.get(z1).unwrap().touches.get(), 0);
        assert_eq!(scene.get(z2).unwrap().touches.get(), 0);
        assert_eq!(scene.get(z3).unwrap().touches.get(), 1);
        // The block asked for a redraw on touch
        assert_eq!(damage.as_slice(), &[Rect::new(10, 10, 29, 29)]);
    }

    #[test]
    fn test_touch_skips_inactive() {
        let mut scene = TestScene::new(64, 64);
        let mut damage = Damage::new();
        let low = scene.add(Block::new(20, 20, Color::RED), 0, 0).unwrap();
        let high = scene.add(Block::new(20, 20, Color::RED), 0, 0).unwrap();
        scene.show(low, 1, &mut damage).unwrap();
        scene.show(high, 2, &mut damage).unwrap();
        scene.set_active(high, false).unwrap();

        let hit = scene.action(ActionKind::Untouch, 3, 3, 3, 3, &mut damage);
        assert_eq!(hit, Some(low));
        assert_eq!(scene.get(high).unwrap().touches.get(), 0);
    }

    #[test]
    fn test_touch_outside_everything() {
        let mut scene = TestScene::new(64, 64);
        let mut damage = Damage::new();
        let a = scene.add(Block::new(5, 5, Color::RED), 0, 0).unwrap();
        scene.show(a, 1, &mut damage).unwrap();
        assert_eq!(
            scene.action(ActionKind::Touch, 40, 40, 40, 40, &mut damage),
            None
        );
    }

    #[test]
    fn test_drag_between_objects() {
        let mut scene = TestScene::new(64, 64);
        let mut damage = Damage::new();
        let left = scene.add(Block::new(10, 10, Color::RED), 0, 0).unwrap();
        let right = scene.add(Block::new(10, 10, Color::RED), 20, 0).unwrap();
        scene.show(left, 1, &mut damage).unwrap();
        scene.show(right, 1, &mut damage).unwrap();

        let hit = scene.action(ActionKind::Move, 25, 5, 5, 5, &mut damage);
        assert_eq!(hit, None);
        assert_eq!(scene.get(left).unwrap().last.get(), Some(ActionKind::MoveOut));
        assert_eq!(scene.get(right).unwrap().last.get(), Some(ActionKind::MoveIn));
    }

    #[test]
    fn test_hold_and_move_inside() {
        let mut scene = TestScene::new(64, 64);
        let mut damage = Damage::new();
        let a = scene.add(Block::new(10, 10, Color::RED), 0, 0).unwrap();
        scene.show(a, 1, &mut damage).unwrap();

        assert_eq!(scene.action(ActionKind::Hold, 3, 3, 3, 3, &mut damage), Some(a));
        assert_eq!(scene.get(a).unwrap().last.get(), Some(ActionKind::Hold));
        assert_eq!(scene.action(ActionKind::Move, 4, 3, 3, 3, &mut damage), Some(a));
        assert_eq!(scene.get(a).unwrap().last.get(), Some(ActionKind::Move));
    }

    #[test]
    fn test_arena_capacity() {
        let mut scene = Scene::<Block, 3>::new(10, 10);
        assert!(scene.add(Block::new(1, 1, Color::RED), 0, 0).is_ok());
        assert!(scene.add(Block::new(1, 1, Color::RED), 0, 0).is_ok());
        assert_eq!(
            scene.add(Block::new(1, 1, Color::RED), 0, 0).err(),
            Some(Error::Overflow)
        );
    }

    mod ordering {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn prop_members_sorted_and_stable(depths in prop::collection::vec(1u32..5, 1..15)) {
                let mut scene = TestScene::new(64, 64);
                let mut damage = heapless::Vec::<Rect, 64>::new();
                let mut shown = heapless::Vec::<(VisHandle, u32, usize), 16>::new();

                for (order, z) in depths.iter().enumerate() {
                    let h = scene.add(Block::new(1, 1, Color::RED), 0, 0).unwrap();
                    scene.show(h, *z, &mut damage).unwrap();
                    shown.push((h, *z, order)).unwrap();

                    let listed: heapless::Vec<VisHandle, 16> = scene.members(ROOT).collect();
                    let keyed: heapless::Vec<(u32, usize), 16> = listed
                        .iter()
                        .map(|h| {
                            let entry = shown.iter().find(|(s, _, _)| s == h).unwrap();
                            (entry.1, entry.2)
                        })
                        .collect();
                    for pair in keyed.windows(2) {
                        // Non-decreasing z, insertion order among equal z
                        prop_assert!(pair[0] < pair[1]);
                    }
                }
            }
        }
    }
}
