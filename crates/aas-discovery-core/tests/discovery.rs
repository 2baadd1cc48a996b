use aas_discovery_core::{
    AssetLink, DeleteOutcome, DiscoveryService, MemoryStore, RegisterOutcome, SearchPage,
};
use std::collections::BTreeMap;

fn links(pairs: &[(&str, &str)]) -> Vec<AssetLink> {
    pairs.iter().map(|(n, v)| AssetLink::new(*n, *v)).collect()
}

fn names_to_values(links: &[AssetLink]) -> BTreeMap<&str, Vec<&str>> {
    let mut map = BTreeMap::<&str, Vec<&str>>::new();
    for link in links {
        map.entry(link.name.as_str())
            .or_default()
            .push(link.value.as_str());
    }
    map
}

#[test]
fn register_search_delete_scenario() {
    let service = DiscoveryService::new(MemoryStore::new());

    service
        .register("A", links(&[("sn", "S1"), ("plant", "P1")]))
        .unwrap();
    service
        .register("B", links(&[("sn", "S2"), ("plant", "P1")]))
        .unwrap();

    let page = service.search(&links(&[("plant", "P1")]), 10, None).unwrap();
    assert_eq!(page.result, vec!["A", "B"]);
    assert_eq!(page.next_cursor(), None);

    let page = service.search(&links(&[("sn", "S1")]), 10, None).unwrap();
    assert_eq!(page.result, vec!["A"]);

    assert_eq!(service.delete("A").unwrap(), DeleteOutcome::Deleted);

    let page = service.search(&links(&[("plant", "P1")]), 10, None).unwrap();
    assert_eq!(page.result, vec!["B"]);
}

#[test]
fn replace_drops_stale_names() {
    let service = DiscoveryService::new(MemoryStore::new());
    let aas = "urn:aas:test:assembler-1";

    service
        .register(
            aas,
            links(&[
                ("globalAssetId", "urn:ga:green-circuit"),
                ("serialNumber", "SN-iron-gear"),
                ("plant", "NAUVIS"),
            ]),
        )
        .unwrap();
    service
        .register(
            aas,
            links(&[
                ("globalAssetId", "urn:ga:green-circuit"),
                ("serialNumber", "SN-red-circuit"),
                ("line", "L1"),
            ]),
        )
        .unwrap();

    let got = service.fetch(aas).unwrap();
    let by_name = names_to_values(&got);
    assert_eq!(by_name.get("serialNumber"), Some(&vec!["SN-red-circuit"]));
    assert_eq!(by_name.get("line"), Some(&vec!["L1"]));
    assert!(!by_name.contains_key("plant"), "stale name still present: {got:?}");

    let page = service
        .search(&links(&[("plant", "NAUVIS")]), 10, None)
        .unwrap();
    assert_eq!(page, SearchPage::empty());
}

#[test]
fn shared_and_unique_pairs() {
    let service = DiscoveryService::new(MemoryStore::new());
    let shared = ("sharedTag", "train-signal");

    service
        .register(
            "urn:aas:test:copper-plate",
            links(&[shared, ("uniqueD", "uranium-fuel-cell")]),
        )
        .unwrap();
    service
        .register(
            "urn:aas:test:iron-gear",
            links(&[shared, ("uniqueE", "rocket-control-unit")]),
        )
        .unwrap();

    let page = service.search(&links(&[shared]), 10, None).unwrap();
    assert_eq!(
        page.result,
        vec!["urn:aas:test:copper-plate", "urn:aas:test:iron-gear"]
    );

    let page = service
        .search(&links(&[("uniqueE", "rocket-control-unit")]), 10, None)
        .unwrap();
    assert_eq!(page.result, vec!["urn:aas:test:iron-gear"]);

    let page = service
        .search(&links(&[("nonexistent", "biters-don't-index")]), 10, None)
        .unwrap();
    assert!(page.result.is_empty());
}

#[test]
fn concurrent_registers_of_same_id_never_merge() {
    let service = DiscoveryService::new(MemoryStore::new());
    let id = "urn:aas:test:contended";
    let sets: Vec<Vec<AssetLink>> = (0..8)
        .map(|i| {
            [
                AssetLink::new("writer", i.to_string()),
                AssetLink::new("round", "r"),
            ]
            .into_iter()
            .chain((0..i).map(|j| AssetLink::new(format!("extra{j}"), "x")))
            .collect()
        })
        .collect();

    std::thread::scope(|scope| {
        for set in &sets {
            let service = &service;
            scope.spawn(move || {
                for _ in 0..50 {
                    service.register(id, set.clone()).unwrap();
                }
            });
        }
    });

    let stored = service.fetch(id).unwrap();
    assert!(sets.contains(&stored), "merged state observed: {stored:?}");

    // Exactly one writer's pairs remain searchable.
    let holders: usize = (0..8)
        .map(|i| {
            service
                .search(&[AssetLink::new("writer", i.to_string())], 10, None)
                .unwrap()
                .result
                .len()
        })
        .sum();
    assert_eq!(holders, 1);
}

#[test]
fn register_outcomes_track_lifecycle() {
    let service = DiscoveryService::new(MemoryStore::new());
    let pairs = links(&[("assetTag", "belt-yellow")]);

    assert_eq!(
        service.register("urn:aas:test:rail-signal", pairs.clone()).unwrap(),
        RegisterOutcome::Created
    );
    assert_eq!(
        service.register("urn:aas:test:rail-signal", pairs.clone()).unwrap(),
        RegisterOutcome::Replaced
    );
    service.delete("urn:aas:test:rail-signal").unwrap();
    assert_eq!(
        service.register("urn:aas:test:rail-signal", pairs).unwrap(),
        RegisterOutcome::Created
    );
}
