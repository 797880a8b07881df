// An identity-keyed side table: per-object data lives in an external store
// addressed by an id, and the map frees that data once the object is gone.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use weak_identity_map::{Tracked, WeakIdentityIntMap, WeakIdentityIntMapBuilder, WeakIdentityMap};

struct Object {
    name: &'static str,
}

struct FieldStore {
    fields: Arc<Mutex<HashMap<i32, Vec<u8>>>>,
    ids: WeakIdentityIntMap<Object>,
    next_id: Mutex<i32>,
}

impl FieldStore {
    fn new() -> Self {
        let fields: Arc<Mutex<HashMap<i32, Vec<u8>>>> = Arc::new(Mutex::new(HashMap::new()));
        let sink = Arc::clone(&fields);
        let ids = WeakIdentityIntMapBuilder::new()
            .default_return_value(-1)
            .build(move |id| {
                sink.lock().remove(&id);
            });
        Self {
            fields,
            ids,
            next_id: Mutex::new(0),
        }
    }

    fn set(&self, obj: &Tracked<Object>, data: Vec<u8>) {
        let mut id = self.ids.get_int(obj);
        if id == -1 {
            let mut next = self.next_id.lock();
            id = *next;
            *next += 1;
            self.ids.put(obj, id);
        }
        self.fields.lock().insert(id, data);
    }

    fn get(&self, obj: &Tracked<Object>) -> Option<Vec<u8>> {
        let id = self.ids.get_int(obj);
        self.fields.lock().get(&id).cloned()
    }

    fn stored(&self) -> usize {
        self.ids.check_queue();
        self.fields.lock().len()
    }
}

#[test]
fn side_data_is_freed_with_its_object() {
    let store = FieldStore::new();
    let a = Tracked::new(Object { name: "a" });
    let b = Tracked::new(Object { name: "b" });
    store.set(&a, vec![1, 2]);
    store.set(&b, vec![3]);
    store.set(&a, vec![4]);

    assert_eq!(a.name, "a");
    assert_eq!(store.get(&a), Some(vec![4]));
    assert_eq!(store.get(&b), Some(vec![3]));
    assert_eq!(store.stored(), 2);

    drop(b);
    assert_eq!(store.stored(), 1);
    assert_eq!(store.get(&a), Some(vec![4]));

    let twin = Tracked::new(Object { name: "a" });
    assert_eq!(store.get(&twin), None, "same contents, different object");
}
