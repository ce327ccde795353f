
use std::collections::BTreeMap;

/// Multimap from a key to an insertion-ordered group of values.
///
/// Besides plain bookkeeping it supports one compound operation, `remove_from_group`:
/// take a value out of its group and return the values that stayed behind.
#[derive( Debug, Clone )]
pub struct ValueMap<K, V> {
    groups: BTreeMap<K, Vec<V>>,
}

impl <K: Ord, V: PartialEq + Clone> ValueMap<K, V> {

    pub fn new() -> ValueMap<K, V> {
	ValueMap { groups: BTreeMap::new() }
    }

    /// Appends the value to the end of the group under key
    pub fn insert( &mut self, key: K, value: V ) {
	self.groups.entry( key ).or_default().push( value );
    }

    /// Values under the key in insertion order
    pub fn group( &self, key: &K ) -> &[V] {
	self.groups.get( key ).map_or( &[], |group| group.as_slice() )
    }

    /// Position of the value inside its group
    pub fn position( &self, key: &K, value: &V ) -> Option<usize> {
	self.groups.get( key )?.iter().position( |v| v == value )
    }

    /// Removes the value from the group under key and returns the remaining values of that group.
    /// Groups that become empty are dropped. A missing key or value leaves the map unchanged.
    pub fn remove_from_group( &mut self, key: &K, value: &V ) -> Vec<V> {
	let Some( group ) = self.groups.get_mut( key ) else {
	    return Vec::new();
	};
	if let Some( position ) = group.iter().position( |v| v == value ) {
	    group.remove( position );
	}
	let remainder = group.clone();
	if group.is_empty() {
	    self.groups.remove( key );
	}
	remainder
    }

    /// Number of non-empty groups
    pub fn len( &self ) -> usize { self.groups.len() }

    pub fn is_empty( &self ) -> bool { self.groups.is_empty() }
}

impl <K: Ord, V: PartialEq + Clone> Default for ValueMap<K, V> {
    fn default() -> Self {
	ValueMap::new()
    }
}

#[cfg(test)]
mod test {

    use super::*;

    #[test]
    fn remove_returns_remainder() {
	let mut map: ValueMap<u64, &str> = ValueMap::new();
	map.insert( 1, "a" );
	map.insert( 1, "b" );
	map.insert( 1, "c" );
	map.insert( 2, "d" );

	assert_eq!( map.remove_from_group( &1, &"b" ), vec!( "a", "c" ));
	assert_eq!( map.group( &1 ), &[ "a", "c" ] );
	assert_eq!( map.position( &1, &"c" ), Some( 1 ));
    }

    #[test]
    fn empty_groups_disappear() {
	let mut map: ValueMap<u64, usize> = ValueMap::new();
	map.insert( 3, 7 );
	assert!( map.remove_from_group( &3, &7 ).is_empty() );
	assert!( map.is_empty() );
	// nothing to remove
	assert!( map.remove_from_group( &3, &7 ).is_empty() );
    }
}
