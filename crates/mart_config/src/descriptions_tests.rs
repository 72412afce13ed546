//! Tests for typed configuration entities.

use super::*;
use crate::entity::HIDDEN;

fn gene_attribute() -> AttributeDescription {
    AttributeDescription::new("ensembl_gene_id", "gene_stable_id", "main").unwrap()
}

fn chromosome_filter() -> FilterDescription {
    FilterDescription::new("chromosome_name", "name", "main", "list").unwrap()
}

mod attribute_description_tests {
    use super::*;

    #[test]
    fn test_new_populates_required_fields() {
        let attribute = gene_attribute();

        assert_eq!(attribute.internal_name(), Some("ensembl_gene_id"));
        assert_eq!(attribute.field(), Some("gene_stable_id"));
        assert_eq!(attribute.table_constraint(), Some("main"));
        assert!(!attribute.is_broken());
    }

    #[test]
    fn test_new_rejects_blank_internal_name() {
        let result = AttributeDescription::new("  ", "gene_stable_id", "main");

        assert!(matches!(
            result,
            Err(ConfigurationError::RequiredFieldMissing { ref field, .. }) if field == INTERNAL_NAME
        ));
    }

    #[test]
    fn test_new_rejects_missing_table_constraint() {
        let result = AttributeDescription::new("ensembl_gene_id", "gene_stable_id", "");
        assert!(result.is_err());
    }

    #[test]
    fn test_broken_when_required_field_cleared() {
        let mut attribute = gene_attribute();
        attribute.entity_mut().set_attribute(FIELD, None);

        assert!(attribute.is_broken());
    }

    #[test]
    fn test_pointer_attribute_not_broken_without_field() {
        let attribute =
            AttributeDescription::pointer("go_term", "hsapiens_gene_ensembl", "go_id").unwrap();

        assert!(attribute.is_pointer());
        assert_eq!(attribute.field(), None);
        assert!(!attribute.is_broken());
    }

    #[test]
    fn test_from_entity_reports_broken_document_entry() {
        let mut entity = ConfigurationEntity::new(EntityKind::Attribute);
        entity.set(INTERNAL_NAME, "band");

        let attribute = AttributeDescription::from_entity(entity);
        assert!(attribute.is_broken());
        assert_eq!(
            attribute.entity().missing_required_fields(),
            vec![FIELD, TABLE_CONSTRAINT]
        );
    }
}

mod filter_description_tests {
    use super::*;

    #[test]
    fn test_complete_filter_not_broken() {
        let filter = chromosome_filter();
        assert_eq!(filter.filter_type(), Some("list"));
        assert!(!filter.is_broken());
    }

    #[test]
    fn test_filter_without_type_is_broken() {
        let mut filter = chromosome_filter();
        filter.entity_mut().set_attribute(FILTER_TYPE, None);
        assert!(filter.is_broken());
    }

    #[test]
    fn test_pointer_filter_exempt_from_field_and_type() {
        let filter = FilterDescription::pointer("go_filter", "go_dataset", "go_id").unwrap();
        assert!(!filter.is_broken());
    }

    #[test]
    fn test_pointer_filter_without_internal_name_is_broken() {
        let mut filter = FilterDescription::pointer("go_filter", "go_dataset", "go_id").unwrap();
        filter.entity_mut().set_attribute(INTERNAL_NAME, None);
        assert!(filter.is_broken());
    }
}

mod link_description_tests {
    use super::*;

    #[test]
    fn test_link_requires_link_name() {
        let result = LinkDescription::new(LinkKind::Exportable, "", &["ensembl_gene_id"]);

        assert!(matches!(
            result,
            Err(ConfigurationError::RequiredFieldMissing { ref field, .. }) if field == LINK_NAME
        ));
    }

    #[test]
    fn test_exportable_references_attributes() {
        let link = LinkDescription::new(
            LinkKind::Exportable,
            "gene_stable_id",
            &["ensembl_gene_id", "ensembl_transcript_id"],
        )
        .unwrap();

        assert_eq!(link.link_name(), Some("gene_stable_id"));
        assert_eq!(
            link.references(),
            vec!["ensembl_gene_id", "ensembl_transcript_id"]
        );
        assert_eq!(
            link.entity().get_attribute(LINK_ATTRIBUTES),
            Some("ensembl_gene_id,ensembl_transcript_id")
        );
        assert!(!link.is_broken());
    }

    #[test]
    fn test_importable_without_filters_is_broken() {
        let link = LinkDescription::new(LinkKind::Importable, "gene_stable_id", &[]).unwrap();
        assert!(link.is_broken());
    }

    #[test]
    fn test_from_entity_without_link_name_fails() {
        let entity = ConfigurationEntity::new(EntityKind::Importable);
        assert!(LinkDescription::from_entity(LinkKind::Importable, entity).is_err());
    }
}

mod container_tests {
    use super::*;

    #[test]
    fn test_empty_collection_not_broken() {
        let collection = AttributeCollection::new("features").unwrap();
        assert!(!collection.is_broken());
    }

    #[test]
    fn test_collection_broken_when_all_descriptions_broken() {
        let mut broken = gene_attribute();
        broken.entity_mut().set_attribute(FIELD, None);

        let collection = AttributeCollection::new("features")
            .unwrap()
            .with_description(broken.clone());
        assert!(collection.is_broken());

        let mixed = collection.with_description(gene_attribute());
        assert!(!mixed.is_broken());
    }

    #[test]
    fn test_page_lookup_and_flattening() {
        let page = FilterPage::new("filters")
            .unwrap()
            .with_collection(
                FilterCollection::new("region")
                    .unwrap()
                    .with_description(chromosome_filter()),
            )
            .with_collection(
                FilterCollection::new("gene")
                    .unwrap()
                    .with_description(FilterDescription::new("biotype", "biotype", "main", "list").unwrap()),
            );

        assert!(page.collection("gene").is_some());
        assert!(page.collection("missing").is_none());

        let names: Vec<_> = page.descriptions().filter_map(|d| d.internal_name()).collect();
        assert_eq!(names, vec!["chromosome_name", "biotype"]);
    }

    #[test]
    fn test_without_hidden_drops_hidden_entries() {
        let mut hidden_attribute = gene_attribute();
        hidden_attribute.entity_mut().set(HIDDEN, "true");

        let mut hidden_collection = AttributeCollection::new("internal").unwrap();
        hidden_collection.entity_mut().set(HIDDEN, "1");

        let page = AttributePage::new("features")
            .unwrap()
            .with_collection(
                AttributeCollection::new("ids")
                    .unwrap()
                    .with_description(hidden_attribute)
                    .with_description(
                        AttributeDescription::new("external_gene_name", "display_label", "xref")
                            .unwrap(),
                    ),
            )
            .with_collection(hidden_collection)
            .without_hidden();

        assert_eq!(page.collections().len(), 1);
        let names: Vec<_> = page.descriptions().filter_map(|d| d.internal_name()).collect();
        assert_eq!(names, vec!["external_gene_name"]);
    }
}
