use std::vec::Vec;

/// One item in a datapool with a used flag
#[derive(Clone)]
struct ReusableItem<T: Clone> {
    reserved: bool,
    item: T,
}

/// Sentinel value used throughout the crate to mean "no node index here".
pub(crate) fn key_none_value() -> u32 {
    u32::MAX
}

/// Cheap pre-check before touching the pool: filters out the sentinel without
/// bounds-checking the buffer. `ObjectPool::key_is_valid` still does the real
/// validation once the key is used to index into the pool.
pub(crate) fn key_might_be_valid(key: u32) -> bool {
    key != key_none_value()
}

///####################################################################################
/// ObjectPool
///####################################################################################
/// Stores re-usable objects to eliminate data allocation overhead when inserting and
/// removing Nodes. Backs every tree's node arena: the ordered `Key -> NodeIndex` map
/// never owns node payloads directly, it only stores the index this pool hands out.
#[derive(Default, Clone)]
pub(crate) struct ObjectPool<T: Clone> {
    buffer: Vec<ReusableItem<T>>,
    first_available: usize,
}

#[allow(dead_code)]
impl<T> ObjectPool<T>
where
    T: Default + Clone,
{
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        ObjectPool {
            buffer: Vec::with_capacity(capacity),
            ..Default::default()
        }
    }

    fn is_next_available(&mut self) -> bool {
        self.first_available + 1 < self.buffer.len()
            && !self.buffer[self.first_available + 1].reserved
    }

    fn check_first_available(&mut self) -> bool {
        if self.first_available < self.buffer.len() && !self.buffer[self.first_available].reserved
        {
            true
        } else if self.is_next_available() {
            self.first_available += 1;
            true
        } else {
            self.first_available = self.buffer.len();
            false
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.buffer.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub(crate) fn push(&mut self, item: T) -> u32 {
        let key = self.allocate();
        *self.get_mut(key) = item;
        key
    }

    pub(crate) fn allocate(&mut self) -> u32 {
        let key = if self.check_first_available() {
            self.buffer[self.first_available].reserved = true;
            self.first_available
        } else {
            // reserve less additional items the more the buffer has already grown
            let x = self.buffer.len().max(10) as f32;
            self.buffer
                .reserve(((100. * x.log10().powf(2.)) / x) as usize);
            self.buffer.push(ReusableItem {
                reserved: true,
                item: T::default(),
            });
            self.buffer.len() - 1
        };
        if self.is_next_available() {
            self.first_available += 1;
        }
        key as u32
    }

    pub(crate) fn pop(&mut self, key: u32) -> Option<T> {
        let key = key as usize;
        if self.key_is_valid(key) {
            self.buffer[key].reserved = false;
            self.first_available = self.first_available.min(key);
            Some(std::mem::take(&mut self.buffer[key].item))
        } else {
            None
        }
    }

    pub(crate) fn free(&mut self, key: u32) -> bool {
        let key = key as usize;
        if self.key_is_valid(key) {
            self.buffer[key].reserved = false;
            self.first_available = self.first_available.min(key);
            true
        } else {
            false
        }
    }

    pub(crate) fn get(&self, key: u32) -> &T {
        let key = key as usize;
        debug_assert!(self.key_is_valid(key));
        &self.buffer[key].item
    }

    pub(crate) fn get_mut(&mut self, key: u32) -> &mut T {
        let key = key as usize;
        debug_assert!(self.key_is_valid(key));
        &mut self.buffer[key].item
    }

    pub(crate) fn key_is_valid(&self, key: usize) -> bool {
        key < self.buffer.len() && self.buffer[key].reserved
    }
}

#[cfg(test)]
mod object_pool_tests {
    use super::ObjectPool;

    #[test]
    fn test_push_pop_modify() {
        let mut pool = ObjectPool::<f32>::with_capacity(3);
        let test_value = 5.;
        let key = pool.push(test_value);
        debug_assert!(*pool.get(key) == test_value);

        *pool.get_mut(key) = 10.;
        debug_assert!(*pool.get(key) == 10.);

        debug_assert!(pool.pop(key).unwrap() == 10.);
        debug_assert!(pool.pop(key).is_none());
    }

    #[test]
    fn test_push_deallocate() {
        let mut pool = ObjectPool::<f32>::with_capacity(3);
        let test_value = 5.;
        let key = pool.push(test_value);
        debug_assert!(*pool.get(key) == test_value);

        pool.free(key);
        debug_assert!(pool.pop(key).is_none());
    }

    #[test]
    fn test_edge_case_reused_item() {
        let mut pool = ObjectPool::<f32>::with_capacity(3);
        let test_value = 5.;
        let key_1 = pool.push(test_value);
        pool.push(test_value * 2.);
        pool.pop(key_1);
        debug_assert!(pool.first_available == 0);

        pool.push(test_value * 3.);
        debug_assert!(*pool.get(key_1) == test_value * 3.);
    }
}
