use bson::doc;
use nexus_bulk::store::MemoryStore;
use nexus_bulk::types::Record;

pub const EMPLOYEES: &str = "employees";

/// `aaa` records with company AAA (ids `emp-0000`...) followed by `bbb` with company BBB.
pub fn employees(aaa: usize, bbb: usize) -> MemoryStore {
    let store = MemoryStore::new();
    store.create_collection(EMPLOYEES);
    let a = (0..aaa).map(|i| {
        let status = if i % 3 == 0 { "inactive" } else { "active" };
        Record::new(
            format!("emp-{i:04}"),
            doc! {"company": "AAA", "status": status, "age": (20 + i % 40) as i64, "active": (i % 2 == 0)},
        )
    });
    let b = (0..bbb).map(|i| {
        Record::new(format!("ext-{i:04}"), doc! {"company": "BBB", "status": "inactive", "age": 50_i64})
    });
    store.insert_many(EMPLOYEES, a.chain(b));
    store
}
