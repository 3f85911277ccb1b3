//! Turns section descriptors plus domain data into an ordered snapshot.
use crate::model::{Banner, Category, Item};
use crate::section::{Row, Section, SectionDescriptor};
use crate::snapshot::{SectionSnapshot, Snapshot};

/// Flatten the catalog in descriptor order.
///
/// - Banner and recommendation sections are skipped while their collection is empty.
/// - A category descriptor renders the current content of the category with the
///   same id from `categories`, falling back to the content captured in the
///   descriptor when that category is no longer in the list.
/// - Row order follows input order only.
pub fn flatten(
    descriptors: &[SectionDescriptor],
    banners: &[Banner],
    categories: &[Category],
    recommended_items: &[Item],
) -> Snapshot {
    let mut sections = Vec::with_capacity(descriptors.len());
    for descriptor in descriptors {
        match descriptor {
            SectionDescriptor::Banner => {
                if banners.is_empty() {
                    continue;
                }
                let rows = banners.iter().map(Row::banner).collect();
                sections.push(SectionSnapshot::new(Section::Banner, rows));
            }
            SectionDescriptor::Category(captured) => {
                let category = categories
                    .iter()
                    .find(|c| c.id == captured.id)
                    .unwrap_or(captured);
                sections.push(SectionSnapshot::new(
                    Section::Category(category.id),
                    category_rows(category),
                ));
            }
            SectionDescriptor::Recommendations => {
                if recommended_items.is_empty() {
                    continue;
                }
                let rows = recommended_items
                    .iter()
                    .map(|item| Row::leaf(item, None))
                    .collect();
                sections.push(SectionSnapshot::new(Section::Recommendations, rows));
            }
        }
    }
    Snapshot::from_sections(sections)
}

fn category_rows(category: &Category) -> Vec<Row> {
    let mut rows = Vec::with_capacity(category.sub_categories.len() + category.item_count());
    for sub in &category.sub_categories {
        rows.push(Row::header(sub));
        rows.extend(sub.items.iter().map(|item| Row::leaf(item, Some(sub.id))));
    }
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Color, SubCategory};
    use crate::section::RowId;

    struct Fixture {
        banner: Banner,
        fruit: Category,
        recs: Vec<Item>,
    }

    fn fixture() -> Fixture {
        let sub = SubCategory::new(
            "sub1",
            vec![Item::new("apple", Color::Red), Item::new("banana", Color::Yellow)],
        );
        Fixture {
            banner: Banner::new("b1", "b1.png", Color::Blue),
            fruit: Category::new("Fruit", vec![sub]),
            recs: vec![Item::new("r1", Color::Gray), Item::new("r2", Color::Pink)],
        }
    }

    fn descriptors(f: &Fixture) -> Vec<SectionDescriptor> {
        vec![
            SectionDescriptor::Banner,
            SectionDescriptor::Category(f.fruit.clone()),
            SectionDescriptor::Recommendations,
        ]
    }

    #[test]
    fn banner_fruit_recommendations() {
        let f = fixture();
        let snap = flatten(
            &descriptors(&f),
            std::slice::from_ref(&f.banner),
            std::slice::from_ref(&f.fruit),
            &f.recs,
        );

        assert_eq!(
            snap.section_identifiers(),
            vec![Section::Banner, Section::Category(f.fruit.id), Section::Recommendations]
        );

        let banner_rows: Vec<RowId> = snap.sections()[0].row_ids().collect();
        assert_eq!(banner_rows, vec![RowId::Banner(f.banner.id)]);

        let sub = &f.fruit.sub_categories[0];
        let fruit_rows: Vec<RowId> = snap.sections()[1].row_ids().collect();
        assert_eq!(
            fruit_rows,
            vec![
                RowId::Header(sub.id),
                RowId::Leaf { item: sub.items[0].id, parent: Some(sub.id) },
                RowId::Leaf { item: sub.items[1].id, parent: Some(sub.id) },
            ]
        );

        let rec_rows: Vec<RowId> = snap.sections()[2].row_ids().collect();
        assert_eq!(
            rec_rows,
            vec![
                RowId::Leaf { item: f.recs[0].id, parent: None },
                RowId::Leaf { item: f.recs[1].id, parent: None },
            ]
        );
    }

    #[test]
    fn empty_collections_skip_their_sections() {
        let f = fixture();
        let snap = flatten(&descriptors(&f), &[], std::slice::from_ref(&f.fruit), &[]);
        assert_eq!(snap.section_identifiers(), vec![Section::Category(f.fruit.id)]);
    }

    #[test]
    fn deterministic_across_calls() {
        let f = fixture();
        let d = descriptors(&f);
        let banners = [f.banner.clone()];
        let cats = [f.fruit.clone()];
        let first = flatten(&d, &banners, &cats, &f.recs);
        for _ in 0..5 {
            assert_eq!(flatten(&d, &banners, &cats, &f.recs), first);
        }
    }

    #[test]
    fn category_content_comes_from_current_list() {
        let f = fixture();
        let d = descriptors(&f);
        let mut updated = f.fruit.clone();
        updated.sub_categories[0].items.pop();

        let snap = flatten(&d, &[], std::slice::from_ref(&updated), &[]);
        assert_eq!(snap.number_of_rows(0), 2);

        // not in the list any more: render what the descriptor captured
        let snap = flatten(&d, &[], &[], &[]);
        assert_eq!(snap.number_of_rows(0), 3);
    }

    #[test]
    fn descriptor_order_wins_over_data_order() {
        let f = fixture();
        let d = vec![
            SectionDescriptor::Recommendations,
            SectionDescriptor::Category(f.fruit.clone()),
            SectionDescriptor::Banner,
        ];
        let snap = flatten(&d, std::slice::from_ref(&f.banner), &[], &f.recs);
        assert_eq!(
            snap.section_identifiers(),
            vec![Section::Recommendations, Section::Category(f.fruit.id), Section::Banner]
        );
    }
}
