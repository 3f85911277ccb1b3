use catalog_feed::config::Mock;
use catalog_feed::model::{Category, Color, Item, SubCategory};
use catalog_feed::provider::{DataProvider, MockDataProvider};
use catalog_feed::section::Section;
use catalog_feed::{apply, diff, CatalogStore, Snapshot};

fn mock() -> MockDataProvider {
    MockDataProvider::new(
        Mock {
            latency_ms: 0,
            total_pages: 2,
            banners: 2,
            recommended_items: 4,
            subcategories_per_category: 2,
            items_per_subcategory: 3,
        },
        2,
    )
}

/// Apply each step to a store and check the round-trip law after every render.
fn assert_roundtrips(store: &mut CatalogStore, steps: Vec<Box<dyn Fn(&mut CatalogStore)>>) {
    let mut rendered = Snapshot::empty();
    for step in steps {
        step(store);
        let next = store.snapshot();
        let d = diff(&rendered, &next);
        assert_eq!(apply(&rendered, &d).unwrap(), next);
        rendered = next;
    }
}

#[tokio::test]
async fn roundtrip_across_a_session() {
    let provider = mock();
    let initial = provider.fetch_all().await.unwrap();
    let refreshed = provider.fetch_updated().await.unwrap();
    let page = provider.fetch_page(2, 2).await.unwrap();

    let mut store = CatalogStore::new();
    let first_cats = initial.categories.clone();
    let steps: Vec<Box<dyn Fn(&mut CatalogStore)>> = vec![
        Box::new(move |s: &mut CatalogStore| {
            s.set_all(
                initial.banners.clone(),
                initial.categories.clone(),
                initial.recommended_items.clone(),
            );
            s.reconcile_descriptors(&initial.categories, Some(1));
        }),
        Box::new(move |s: &mut CatalogStore| {
            s.append_categories(page.categories.clone());
            let cats = s.categories().to_vec();
            s.reconcile_descriptors(&cats, None);
        }),
        Box::new(|s: &mut CatalogStore| s.move_recommendations(0)),
        Box::new(move |s: &mut CatalogStore| {
            // shuffle items inside the first category
            let mut cats = s.categories().to_vec();
            if let Some(sub) = cats.first_mut().and_then(|c| c.sub_categories.first_mut()) {
                sub.items.reverse();
                sub.items.push(Item::new("late arrival", Color::Green));
            }
            s.replace_categories(cats);
        }),
        Box::new(move |s: &mut CatalogStore| {
            s.set_all(
                refreshed.banners.clone(),
                refreshed.categories.clone(),
                refreshed.recommended_items.clone(),
            );
            s.reconcile_descriptors(&refreshed.categories, None);
        }),
        Box::new(|s: &mut CatalogStore| {
            let cats = s.categories().to_vec();
            s.set_all(vec![], cats, vec![]);
        }),
    ];
    assert_roundtrips(&mut store, steps);

    // recommendations and banners are gone, only the refreshed categories remain
    let snap = store.snapshot();
    assert!(snap.index_of_section(Section::Banner).is_none());
    assert!(snap.index_of_section(Section::Recommendations).is_none());
    assert!(first_cats
        .iter()
        .all(|c| snap.index_of_section(Section::Category(c.id)).is_none()));
}

#[test]
fn empty_category_still_renders_a_section() {
    let mut store = CatalogStore::new();
    let empty = Category::new("Empty", vec![]);
    let full = Category::new(
        "Full",
        vec![SubCategory::new("sub", vec![Item::new("a", Color::Red)])],
    );
    let cats = vec![empty.clone(), full];
    store.set_all(vec![], cats.clone(), vec![]);
    store.reconcile_descriptors(&cats, None);

    let snap = store.snapshot();
    assert_eq!(snap.number_of_sections(), 2);
    let idx = snap.index_of_section(Section::Category(empty.id)).unwrap();
    assert_eq!(snap.number_of_rows(idx), 0);
}
