//! Content planning and assembly
//!
//! Pure functions for the content stage: planning the ordered section
//! sequence an outline implies, compiling persisted sections into the final
//! document, and taking the character-bounded excerpts used as continuity
//! context between generation calls. No external state; assembly sorts its
//! input internally so output is independent of call order.

use draftforge_common::db::models::{Section, SectionKind};
use draftforge_common::documents::ArticleOutline;

/// One planned unit of generation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedSection {
    /// Target order value: 0 = introduction, 1..N body, N+1 conclusion
    pub order: i32,
    pub kind: SectionKind,
    /// Heading persisted with the section; the introduction carries the
    /// outline title, the conclusion a fixed heading
    pub heading: String,
    /// Index into the outline's section list for body sections
    pub outline_index: Option<usize>,
}

/// Plan the strictly ordered generation sequence for an outline
pub fn plan_sections(outline: &ArticleOutline) -> Vec<PlannedSection> {
    let mut plan = Vec::with_capacity(outline.sections.len() + 2);

    plan.push(PlannedSection {
        order: 0,
        kind: SectionKind::Introduction,
        heading: outline.title.clone(),
        outline_index: None,
    });

    for (i, section) in outline.sections.iter().enumerate() {
        plan.push(PlannedSection {
            order: (i + 1) as i32,
            kind: SectionKind::Section,
            heading: section.heading.clone(),
            outline_index: Some(i),
        });
    }

    plan.push(PlannedSection {
        order: outline.sections.len() as i32 + 1,
        kind: SectionKind::Conclusion,
        heading: "Conclusion".to_string(),
        outline_index: None,
    });

    plan
}

/// Compile persisted sections into the final document.
///
/// Sections are sorted by order ascending and their bodies joined with a
/// blank line. The introduction is prefixed with a level-1 heading built
/// from its stored heading (the outline title); every other section is
/// expected to carry its own heading markup already.
pub fn assemble(sections: &[Section]) -> String {
    let mut ordered: Vec<&Section> = sections.iter().collect();
    ordered.sort_by_key(|s| s.order);

    ordered
        .iter()
        .map(|s| match s.section_kind() {
            SectionKind::Introduction => format!("# {}\n\n{}", s.heading, s.content),
            _ => s.content.clone(),
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Character-bounded prefix of a text, safe on multi-byte content
pub fn excerpt(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use draftforge_common::documents::OutlineSection;
    use uuid::Uuid;

    fn outline(section_count: usize) -> ArticleOutline {
        ArticleOutline {
            title: "Best Hiking Boots for Every Trail".to_string(),
            sections: (0..section_count)
                .map(|i| OutlineSection {
                    heading: format!("Section {}", i + 1),
                    intent: format!("intent {}", i + 1),
                    keywords_to_include: vec![],
                })
                .collect(),
        }
    }

    fn section(order: i32, kind: SectionKind, heading: &str, content: &str) -> Section {
        let now = chrono::Utc::now();
        Section {
            id: Uuid::new_v4(),
            draft_id: Uuid::new_v4(),
            heading: heading.to_string(),
            content: content.to_string(),
            order,
            kind: String::from(kind),
            created_at: now.into(),
        }
    }

    #[test]
    fn test_plan_for_three_section_outline() {
        let plan = plan_sections(&outline(3));

        assert_eq!(plan.len(), 5);
        let orders: Vec<i32> = plan.iter().map(|p| p.order).collect();
        assert_eq!(orders, vec![0, 1, 2, 3, 4]);

        let kinds: Vec<SectionKind> = plan.iter().map(|p| p.kind).collect();
        assert_eq!(
            kinds,
            vec![
                SectionKind::Introduction,
                SectionKind::Section,
                SectionKind::Section,
                SectionKind::Section,
                SectionKind::Conclusion,
            ]
        );

        assert_eq!(plan[0].heading, "Best Hiking Boots for Every Trail");
        assert_eq!(plan[2].heading, "Section 2");
        assert_eq!(plan[2].outline_index, Some(1));
        assert_eq!(plan[4].heading, "Conclusion");
    }

    #[test]
    fn test_plan_orders_are_contiguous_for_any_size() {
        for count in [1, 6, 8] {
            let plan = plan_sections(&outline(count));
            assert_eq!(plan.len(), count + 2);
            for (i, planned) in plan.iter().enumerate() {
                assert_eq!(planned.order, i as i32);
            }
        }
    }

    #[test]
    fn test_assemble_structure() {
        let sections = vec![
            section(0, SectionKind::Introduction, "Best Boots", "Intro body."),
            section(1, SectionKind::Section, "Fit", "## Fit\n\nFit body."),
            section(2, SectionKind::Conclusion, "Conclusion", "Wrap up."),
        ];

        let compiled = assemble(&sections);
        assert_eq!(
            compiled,
            "# Best Boots\n\nIntro body.\n\n## Fit\n\nFit body.\n\nWrap up."
        );
        assert!(compiled.starts_with("# Best Boots\n"));
    }

    #[test]
    fn test_assemble_is_order_independent() {
        let a = section(0, SectionKind::Introduction, "Title", "Intro.");
        let b = section(1, SectionKind::Section, "One", "## One\n\nBody one.");
        let c = section(2, SectionKind::Section, "Two", "## Two\n\nBody two.");
        let d = section(3, SectionKind::Conclusion, "Conclusion", "Done.");

        let sorted = assemble(&[a.clone(), b.clone(), c.clone(), d.clone()]);
        let shuffled = assemble(&[c, a, d, b]);
        assert_eq!(sorted, shuffled);
    }

    #[test]
    fn test_assemble_empty() {
        assert_eq!(assemble(&[]), "");
    }

    #[test]
    fn test_excerpt_bounds() {
        assert_eq!(excerpt("short", 200), "short");
        assert_eq!(excerpt("abcdef", 3), "abc");
        // Multi-byte characters never split
        assert_eq!(excerpt("köttbullar", 2), "kö");
    }
}
