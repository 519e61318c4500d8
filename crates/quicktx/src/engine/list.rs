//! Intrusive doubly linked lists over the pool's slot arena.
//!
//! Links live in a side table indexed by slot, so moving a wrapper between
//! lists never allocates. Each slot records which list it is on; touching a
//! slot through the wrong list is treated as corruption.

const NIL: u32 = u32::MAX;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Membership {
    Detached,
    Queued,
    Wait,
    Freed,
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct Link {
    on: Membership,
    prev: u32,
    next: u32,
}

impl Link {
    pub(crate) const DETACHED: Link = Link {
        on: Membership::Detached,
        prev: NIL,
        next: NIL,
    };

    #[inline]
    pub(crate) fn membership(&self) -> Membership {
        self.on
    }
}

#[derive(Debug)]
pub(crate) struct List {
    kind: Membership,
    head: u32,
    tail: u32,
    len: usize,
}

impl List {
    pub(crate) fn new(kind: Membership) -> Self {
        debug_assert!(kind != Membership::Detached);
        Self {
            kind,
            head: NIL,
            tail: NIL,
            len: 0,
        }
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub(crate) fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub(crate) fn front(&self) -> Option<u32> {
        (self.head != NIL).then_some(self.head)
    }

    pub(crate) fn push_back(&mut self, links: &mut [Link], idx: u32) {
        self.attach(links, idx);
        let link = &mut links[idx as usize];
        link.prev = self.tail;
        link.next = NIL;
        if self.tail == NIL {
            self.head = idx;
        } else {
            links[self.tail as usize].next = idx;
        }
        self.tail = idx;
        self.len += 1;
    }

    pub(crate) fn push_front(&mut self, links: &mut [Link], idx: u32) {
        self.attach(links, idx);
        let link = &mut links[idx as usize];
        link.prev = NIL;
        link.next = self.head;
        if self.head == NIL {
            self.tail = idx;
        } else {
            links[self.head as usize].prev = idx;
        }
        self.head = idx;
        self.len += 1;
    }

    pub(crate) fn unlink(&mut self, links: &mut [Link], idx: u32) {
        let Link { on, prev, next } = links[idx as usize];
        assert!(
            on == self.kind,
            "list corruption: slot {} is {:?}, not on {:?}",
            idx,
            on,
            self.kind
        );

        if prev == NIL {
            self.head = next;
        } else {
            links[prev as usize].next = next;
        }
        if next == NIL {
            self.tail = prev;
        } else {
            links[next as usize].prev = prev;
        }

        links[idx as usize] = Link::DETACHED;
        self.len -= 1;
    }

    pub(crate) fn pop_front(&mut self, links: &mut [Link]) -> Option<u32> {
        let idx = self.front()?;
        self.unlink(links, idx);
        Some(idx)
    }

    /// Walks the list front to back.
    pub(crate) fn iter<'a>(&self, links: &'a [Link]) -> ListIter<'a> {
        ListIter { links, cur: self.head }
    }

    fn attach(&self, links: &mut [Link], idx: u32) {
        let link = &mut links[idx as usize];
        assert!(
            link.on == Membership::Detached,
            "list corruption: slot {} is already on {:?}",
            idx,
            link.on
        );
        link.on = self.kind;
    }
}

pub(crate) struct ListIter<'a> {
    links: &'a [Link],
    cur: u32,
}

impl Iterator for ListIter<'_> {
    type Item = u32;

    fn next(&mut self) -> Option<u32> {
        if self.cur == NIL {
            return None;
        }
        let idx = self.cur;
        self.cur = self.links[idx as usize].next;
        Some(idx)
    }
}
