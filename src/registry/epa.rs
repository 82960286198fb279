//! Environmental Protection Agency datasets: occurrence data for the
//! Unregulated Contaminant Monitoring Rule, rounds 2 and 3. The two
//! occurrence files do not share an identical column set, so the plan
//! declares the merged output layout explicitly and each fragment is
//! projected onto it.

use super::{ConsolidatePlan, DatasetSpec, DownloadPlan, FactJoin, FactPlan, ReferencePlan};
use crate::loader::TableSource;
use crate::schema::ColumnType::{Float, Text};
use crate::schema::Schema;

const UCMR3_ZIP: &str = "ucmr-3-occurrence-data.zip";
const UCMR2_ZIP: &str = "ucmr2_occurrencedata_jan12.zip";

/// Union of the UCMR3 columns (plus the disinfectant type joined from
/// the DRT table and the zip codes lookup) and UCMR2's own
/// DisinfectantType column.
const OUTPUT_COLUMNS: &[&str] = &[
    "PWSID",
    "PWSName",
    "Size",
    "FacilityID",
    "FacilityName",
    "FacilityWaterType",
    "SamplePointID",
    "SamplePointName",
    "SamplePointType",
    "AssociatedFacilityID",
    "AssociatedSamplePointID",
    "CollectionDate",
    "SampleID",
    "Contaminant",
    "MRL",
    "MethodID",
    "AnalyticalResultsSign",
    "AnalyticalResultValue",
    "SampleEventCode",
    "MonitoringRequirement",
    "Region",
    "State",
    "Disinfectant Type",
    "ZIPCODE",
    "DisinfectantType",
];

pub(super) fn ucmr() -> DatasetSpec {
    DatasetSpec {
        id: "epa:ucmr",
        agency: "epa",
        dataset: "ucmr",
        title: "Occurrence Data for the Unregulated Contaminant Monitoring Rule (2,3)",
        website: "https://www.epa.gov/dwucmr/occurrence-data-unregulated-contaminant-monitoring-rule",
        docs: "https://www.epa.gov/sites/production/files/2016-05/documents/ucmr3-data-summary-april-2016.pdf",
        subdir: "epa/ucmr",
        download: DownloadPlan::Static {
            base: "https://www.epa.gov/sites/production/files/",
            files: &[
                "2015-09/ucmr-3-occurrence-data.zip",
                "2015-09/ucmr2_occurrencedata_jan12.zip",
            ],
        },
        consolidate: ConsolidatePlan {
            chunk_size: 10_000,
            references: vec![
                ReferencePlan {
                    name: "drt",
                    base: TableSource::zip_member(UCMR3_ZIP, "UCMR3_DRT.txt")
                        .tab()
                        .latin1(),
                    // The occurrence file has its own SampleEventCode;
                    // the DRT copy is not part of the output.
                    renames: &[("SampleEventCode", "drt_sample_event_code")],
                    joins: Vec::new(),
                },
                ReferencePlan {
                    name: "zipcodes",
                    base: TableSource::zip_member(UCMR3_ZIP, "UCMR3_ZipCodes.txt")
                        .tab()
                        .latin1(),
                    renames: &[],
                    joins: Vec::new(),
                },
            ],
            facts: vec![
                FactPlan {
                    source: TableSource::zip_member(UCMR3_ZIP, "UCMR3_All.txt")
                        .tab()
                        .latin1(),
                    renames: &[],
                    lenient_numeric: &[],
                    joins: vec![
                        FactJoin {
                            reference: "drt",
                            on: &["PWSID", "FacilityID", "SamplePointID", "CollectionDate"],
                        },
                        FactJoin {
                            reference: "zipcodes",
                            on: &["PWSID"],
                        },
                    ],
                },
                FactPlan {
                    source: TableSource::zip_member(UCMR2_ZIP, "UCMR2_All_OccurrenceData_Jan12.txt")
                        .tab()
                        .latin1(),
                    renames: &[],
                    lenient_numeric: &[],
                    joins: vec![FactJoin {
                        reference: "zipcodes",
                        on: &["PWSID"],
                    }],
                },
            ],
            output_columns: Some(OUTPUT_COLUMNS),
        },
        schema: Schema::new(vec![
            ("PWSID", Text),
            ("PWSName", Text),
            ("Size", Text),
            ("FacilityID", Text),
            ("FacilityName", Text),
            ("FacilityWaterType", Text),
            ("SamplePointID", Text),
            ("SamplePointName", Text),
            ("SamplePointType", Text),
            ("AssociatedFacilityID", Text),
            ("AssociatedSamplePointID", Text),
            ("CollectionDate", Text),
            ("SampleID", Text),
            ("Contaminant", Text),
            ("MRL", Float),
            ("MethodID", Text),
            ("AnalyticalResultsSign", Text),
            ("AnalyticalResultValue", Float),
            ("SampleEventCode", Text),
            ("MonitoringRequirement", Text),
            ("Region", Text),
            ("State", Text),
            ("Disinfectant Type", Text),
            ("ZIPCODE", Text),
            ("DisinfectantType", Text),
        ]),
    }
}
