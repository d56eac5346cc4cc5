use std::collections::HashSet;

use tracing::debug;

use crate::error::{Error, Result};
use crate::memory::layout::{Layout, MAX_ACTORS};
use crate::memory::{Field, ReadMemory, Shape, checked_offset};
use crate::names::NameHandle;

/// An address that appeared since the previous poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NewActor {
    pub address: u64,
    pub handle: NameHandle,
}

/// Live actor addresses as of the last successful poll.
#[derive(Debug, Default)]
pub struct ActorSnapshot {
    live: HashSet<u64>,
    /// Live addresses whose identity could not be read yet
    unresolved: HashSet<u64>,
}

impl ActorSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, address: u64) -> bool {
        self.live.contains(&address)
    }

    pub fn len(&self) -> usize {
        self.live.len()
    }

    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }

    /// Retry `address` on the next poll while it stays live.
    pub fn mark_unresolved(&mut self, address: u64) {
        if self.live.contains(&address) {
            self.unresolved.insert(address);
        }
    }

    /// Read the actor array and return the addresses not seen before.
    ///
    /// Nothing is committed unless the level, array header and array body
    /// were all read; a fault leaves the previous set untouched.
    pub fn poll<R: ReadMemory>(
        &mut self,
        reader: &R,
        world: u64,
        layout: &Layout,
    ) -> Result<Vec<NewActor>> {
        let addresses = read_actor_array(reader, world, layout)?;

        let mut live = HashSet::with_capacity(addresses.len());
        let mut unresolved = HashSet::new();
        let mut new_actors = Vec::new();
        let identity = Shape::new(&[Field::U16, Field::U16]);

        for address in addresses {
            if address == 0 || !live.insert(address) {
                continue;
            }
            let seen = self.live.contains(&address) && !self.unresolved.contains(&address);
            if seen {
                continue;
            }

            let identity_read = checked_offset(address, layout.actor_fname)
                .and_then(|addr| reader.read(addr, &identity));
            match identity_read {
                Ok(pair) => new_actors.push(NewActor {
                    address,
                    handle: NameHandle::from_raw_pair(pair.u64(0)? as u16, pair.u64(1)? as u16),
                }),
                Err(e) => {
                    debug!("Identity of actor {:#x} unreadable: {}", address, e);
                    unresolved.insert(address);
                }
            }
        }

        self.live = live;
        self.unresolved = unresolved;
        Ok(new_actors)
    }
}

fn read_actor_array<R: ReadMemory>(reader: &R, world: u64, layout: &Layout) -> Result<Vec<u64>> {
    let level = reader.read_ptr(checked_offset(world, layout.persistent_level)?)?;
    let header_addr = checked_offset(level, layout.actor_array)?;
    let header = reader.read(header_addr, &Shape::new(&[Field::U64, Field::I32]))?;
    let data = header.u64(0)?;
    let count = header.i64(1)?;

    if !(0..=MAX_ACTORS as i64).contains(&count) {
        return Err(Error::decode(
            header_addr,
            format!("actor count {} out of range", count),
        ));
    }

    reader.read_u64_array(data, count as usize)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MockMemoryBuilder;

    const WORLD: u64 = 0x1000;
    const LEVEL: u64 = 0x2000;
    const ARRAY: u64 = 0x3000;

    fn world_with(actors: &[u64]) -> MockMemoryBuilder {
        let layout = Layout::default();
        let mut builder = MockMemoryBuilder::new()
            .u64(WORLD + layout.persistent_level, LEVEL)
            .u64(LEVEL + layout.actor_array, ARRAY)
            .i32(LEVEL + layout.actor_array + 8, actors.len() as i32)
            .u64_array(ARRAY, actors);
        for (i, &actor) in actors.iter().enumerate() {
            if actor != 0 {
                builder = builder
                    .u16(actor + layout.actor_fname, i as u16)
                    .u16(actor + layout.actor_fname + 2, 1);
            }
        }
        builder
    }

    fn addresses(new_actors: &[NewActor]) -> Vec<u64> {
        let mut addrs: Vec<u64> = new_actors.iter().map(|a| a.address).collect();
        addrs.sort_unstable();
        addrs
    }

    #[test]
    fn test_zero_addresses_are_skipped() {
        let reader = world_with(&[0xA000, 0xB000, 0]).build();
        let mut snapshot = ActorSnapshot::new();

        let new_actors = snapshot.poll(&reader, WORLD, &Layout::default()).unwrap();
        assert_eq!(addresses(&new_actors), vec![0xA000, 0xB000]);
        assert_eq!(snapshot.len(), 2);
        assert!(!snapshot.contains(0));
    }

    #[test]
    fn test_address_near_space_end_is_unresolved() {
        let garbage = u64::MAX - 4;
        let reader = world_with(&[0xA000]).build();
        reader.write_bytes(LEVEL + Layout::default().actor_array + 8, &2i32.to_le_bytes());
        reader.write_u64(ARRAY + 8, garbage);
        let mut snapshot = ActorSnapshot::new();

        let new_actors = snapshot.poll(&reader, WORLD, &Layout::default()).unwrap();
        assert_eq!(addresses(&new_actors), vec![0xA000]);
        assert!(snapshot.contains(garbage));
        assert!(snapshot.unresolved.contains(&garbage));
    }

    #[test]
    fn test_identity_pair_order() {
        let reader = world_with(&[0xA000, 0xB000]).build();
        let mut snapshot = ActorSnapshot::new();

        let new_actors = snapshot.poll(&reader, WORLD, &Layout::default()).unwrap();
        let b = new_actors.iter().find(|a| a.address == 0xB000).unwrap();
        assert_eq!(b.handle, NameHandle::new(1, 1));
    }

    #[test]
    fn test_second_poll_reports_only_new() {
        let layout = Layout::default();
        let reader = world_with(&[0xA000, 0xB000]).build();
        let mut snapshot = ActorSnapshot::new();
        snapshot.poll(&reader, WORLD, &layout).unwrap();

        // B unloads, C appears
        let next = world_with(&[0xA000, 0xC000]).build();
        let new_actors = snapshot.poll(&next, WORLD, &layout).unwrap();
        assert_eq!(addresses(&new_actors), vec![0xC000]);
        assert!(snapshot.contains(0xA000));
        assert!(!snapshot.contains(0xB000));
    }

    #[test]
    fn test_fault_keeps_previous_snapshot() {
        let layout = Layout::default();
        let reader = world_with(&[0xA000, 0xB000]).build();
        let mut snapshot = ActorSnapshot::new();
        snapshot.poll(&reader, WORLD, &layout).unwrap();

        reader.unmap(ARRAY, 16);
        assert!(snapshot.poll(&reader, WORLD, &layout).is_err());
        assert!(snapshot.contains(0xA000));
        assert!(snapshot.contains(0xB000));
    }

    #[test]
    fn test_count_out_of_range() {
        let layout = Layout::default();
        let reader = world_with(&[0xA000]).build();
        reader.write_bytes(LEVEL + layout.actor_array + 8, &(-1i32).to_le_bytes());

        let mut snapshot = ActorSnapshot::new();
        let err = snapshot.poll(&reader, WORLD, &layout).unwrap_err();
        assert!(err.is_read_fault());
        assert!(snapshot.is_empty());
    }

    #[test]
    fn test_unreadable_identity_is_retried() {
        let layout = Layout::default();
        let reader = world_with(&[0xA000, 0xB000]).build();
        reader.unmap(0xB000 + layout.actor_fname, 4);

        let mut snapshot = ActorSnapshot::new();
        let first = snapshot.poll(&reader, WORLD, &layout).unwrap();
        assert_eq!(addresses(&first), vec![0xA000]);
        assert!(snapshot.contains(0xB000));

        reader.write_bytes(0xB000 + layout.actor_fname, &[7, 0, 2, 0]);
        let second = snapshot.poll(&reader, WORLD, &layout).unwrap();
        assert_eq!(second.len(), 1);
        assert_eq!(second[0].address, 0xB000);
        assert_eq!(second[0].handle, NameHandle::new(2, 7));
    }

    #[test]
    fn test_mark_unresolved_requeues_live_address() {
        let layout = Layout::default();
        let reader = world_with(&[0xA000]).build();
        let mut snapshot = ActorSnapshot::new();
        snapshot.poll(&reader, WORLD, &layout).unwrap();

        snapshot.mark_unresolved(0xA000);
        snapshot.mark_unresolved(0xF000);
        let again = snapshot.poll(&reader, WORLD, &layout).unwrap();
        assert_eq!(addresses(&again), vec![0xA000]);
    }
}
