//! Bureau of Labor Statistics datasets: Quarterly Census of Employment
//! and Wages (cew) and the national/state employment time series
//! (ce, sm). File names, join keys and column types follow the BLS
//! flat-file layouts exactly.

use super::{ConsolidatePlan, DatasetSpec, DownloadPlan, FactJoin, FactPlan, RefJoin, ReferencePlan};
use crate::loader::TableSource;
use crate::schema::ColumnType::{Float, Integer, Text};
use crate::schema::IntWidth::I16;
use crate::schema::Schema;

const TIME_SERIES_BASE: &str = "https://download.bls.gov/pub/time.series/";

pub(super) fn cew() -> DatasetSpec {
    DatasetSpec {
        id: "bls:cew",
        agency: "bls",
        dataset: "cew",
        title: "Quarterly Census of Employment and Wages",
        website: "https://www.bls.gov/cew/datatoc.htm",
        docs: "https://www.bls.gov/cew/doctoc.htm",
        subdir: "bls/cew",
        download: DownloadPlan::Scraped {
            page: "https://www.bls.gov/cew/datatoc.htm",
            base: "https://www.bls.gov/",
            patterns: &[
                r"(?P<url>cew/data/files/[0-9]{4}/csv/(?P<year>[0-9]{4})_qtrly_naics10_totals\.zip)",
                r"(?P<url>cew/data/files/[0-9]{4}/csv/(?P<year>[0-9]{4})_qtrly_by_industry\.zip)",
            ],
        },
        consolidate: ConsolidatePlan {
            chunk_size: 10_000,
            references: Vec::new(),
            facts: vec![FactPlan {
                source: TableSource::zip_scan(r"all industries\.csv"),
                // The publisher ships the over-the-year percent column
                // under a duplicated name; remap it silently.
                renames: &[("oty_taxable_qtrly_wages_chg.1", "oty_taxable_qtrly_wages_pct")],
                lenient_numeric: &[],
                joins: Vec::new(),
            }],
            output_columns: None,
        },
        schema: Schema::new(vec![
            ("area_fips", Text),
            ("own_code", Text),
            ("industry_code", Text),
            ("agglvl_code", Text),
            ("size_code", Text),
            ("year", Text),
            ("qtr", Float),
            ("disclosure_code", Text),
            ("area_title", Text),
            ("own_title", Text),
            ("industry_title", Text),
            ("agglvl_title", Text),
            ("size_title", Text),
            ("qtrly_estabs_count", Float),
            ("month1_emplvl", Float),
            ("month2_emplvl", Float),
            ("month3_emplvl", Float),
            ("total_qtrly_wages", Float),
            ("taxable_qtrly_wages", Float),
            ("qtrly_contributions", Float),
            ("avg_wkly_wage", Float),
            ("lq_disclosure_code", Text),
            ("lq_qtrly_estabs_count", Float),
            ("lq_month1_emplvl", Float),
            ("lq_month2_emplvl", Float),
            ("lq_month3_emplvl", Float),
            ("lq_total_qtrly_wages", Float),
            ("lq_taxable_qtrly_wages", Float),
            ("lq_qtrly_contributions", Float),
            ("lq_avg_wkly_wage", Float),
            ("oty_disclosure_code", Text),
            ("oty_qtrly_estabs_count_chg", Float),
            ("oty_qtrly_estabs_count_pct_chg", Float),
            ("oty_month1_emplvl_chg", Float),
            ("oty_month1_emplvl_pct", Float),
            ("oty_month2_emplvl_chg", Float),
            ("oty_month2_emplvl_pct", Float),
            ("oty_month3_emplvl_chg", Float),
            ("oty_month3_emplvl_pct", Float),
            ("oty_total_qtrly_wages_chg", Float),
            ("oty_total_qtrly_wages_pct", Float),
            ("oty_taxable_qtrly_wages_chg", Float),
            ("oty_taxable_qtrly_wages_pct", Float),
            ("oty_qtrly_contributions_chg", Float),
            ("oty_qtrly_contributions_pct", Float),
            ("oty_avg_wkly_wage_chg", Float),
            ("oty_avg_wkly_wage_pct", Float),
        ]),
    }
}

pub(super) fn ce() -> DatasetSpec {
    DatasetSpec {
        id: "bls:ce",
        agency: "bls",
        dataset: "ce",
        title: "Employment, Hours, and Earnings - National",
        website: "https://download.bls.gov/pub/time.series/ce/",
        docs: "https://download.bls.gov/pub/time.series/ce/ce.txt",
        subdir: "bls/ce",
        download: DownloadPlan::Static {
            base: TIME_SERIES_BASE,
            files: &[
                "ce/ce.data.0.AllCESSeries",
                "ce/ce.datatype",
                "ce/ce.industry",
                "ce/ce.period",
                "ce/ce.seasonal",
                "ce/ce.series",
                "ce/ce.supersector",
            ],
        },
        consolidate: ConsolidatePlan {
            chunk_size: 10_000,
            references: vec![
                ReferencePlan {
                    name: "series",
                    base: TableSource::file("ce.series").tab(),
                    // The fact file carries its own footnote_codes.
                    renames: &[("footnote_codes", "footnote_code_series")],
                    joins: vec![
                        RefJoin {
                            source: TableSource::file("ce.datatype").tab(),
                            on: &["data_type_code"],
                        },
                        RefJoin {
                            source: TableSource::file("ce.industry").tab(),
                            on: &["industry_code"],
                        },
                        // Depends on the seasonal code column already
                        // present in ce.series; must come after it.
                        RefJoin {
                            source: TableSource::file("ce.seasonal")
                                .tab()
                                .replace_header(&["seasonal", "season_text"]),
                            on: &["seasonal"],
                        },
                        RefJoin {
                            source: TableSource::file("ce.supersector").tab(),
                            on: &["supersector_code"],
                        },
                    ],
                },
                ReferencePlan {
                    name: "period",
                    base: TableSource::file("ce.period")
                        .tab()
                        .columns(&["period", "period_abbr", "period_name"]),
                    renames: &[],
                    joins: Vec::new(),
                },
            ],
            facts: vec![FactPlan {
                source: TableSource::file("ce.data.0.AllCESSeries").tab(),
                renames: &[],
                lenient_numeric: &[],
                joins: vec![
                    FactJoin {
                        reference: "series",
                        on: &["series_id"],
                    },
                    FactJoin {
                        reference: "period",
                        on: &["period"],
                    },
                ],
            }],
            output_columns: None,
        },
        schema: Schema::new(vec![
            ("data_type_text", Text),
            ("industry_name", Text),
            ("period_name", Text),
            ("series_title", Text),
            ("supersector_name", Text),
            ("series_id", Text),
            ("industry_code", Text),
            ("naics_code", Text),
            ("period", Text),
            ("footnote_codes", Text),
            ("sort_sequence", Text),
            ("publishing_status", Text),
            ("supersector_code", Text),
            ("data_type_code", Text),
            ("seasonal", Text),
            ("footnote_code_series", Text),
            ("begin_period", Text),
            ("end_period", Text),
            ("display_level", Text),
            ("selectable", Text),
            ("season_text", Text),
            ("period_abbr", Text),
            ("year", Integer(I16)),
            ("value", Float),
            ("begin_year", Integer(I16)),
            ("end_year", Integer(I16)),
        ]),
    }
}

pub(super) fn sm() -> DatasetSpec {
    DatasetSpec {
        id: "bls:sm",
        agency: "bls",
        dataset: "sm",
        title: "Employment, Hours, and Earnings - State and Metro Area",
        website: "https://download.bls.gov/pub/time.series/sm/",
        docs: "https://download.bls.gov/pub/time.series/sm/sm.txt",
        subdir: "bls/sm",
        download: DownloadPlan::Static {
            base: TIME_SERIES_BASE,
            files: &[
                "sm/sm.data.1.AllData",
                "sm/sm.area",
                "sm/sm.data_type",
                "sm/sm.industry",
                "sm/sm.series",
                "sm/sm.state",
                "sm/sm.supersector",
            ],
        },
        consolidate: ConsolidatePlan {
            chunk_size: 10_000,
            references: vec![ReferencePlan {
                name: "series",
                base: TableSource::file("sm.series").tab(),
                renames: &[("footnote_codes", "footnote_code_series")],
                joins: vec![
                    RefJoin {
                        source: TableSource::file("sm.area").tab(),
                        on: &["area_code"],
                    },
                    RefJoin {
                        source: TableSource::file("sm.supersector").tab(),
                        on: &["supersector_code"],
                    },
                    RefJoin {
                        source: TableSource::file("sm.data_type").tab(),
                        on: &["data_type_code"],
                    },
                    RefJoin {
                        source: TableSource::file("sm.industry").tab(),
                        on: &["industry_code"],
                    },
                    RefJoin {
                        source: TableSource::file("sm.state").tab(),
                        on: &["state_code"],
                    },
                ],
            }],
            facts: vec![FactPlan {
                source: TableSource::file("sm.data.1.AllData").tab(),
                renames: &[],
                // The state/metro value column carries stray text;
                // parse it forgivingly rather than failing fragments.
                lenient_numeric: &["value"],
                joins: vec![FactJoin {
                    reference: "series",
                    on: &["series_id"],
                }],
            }],
            output_columns: None,
        },
        schema: Schema::new(vec![
            ("area_code", Text),
            ("area_name", Text),
            ("benchmark_year", Integer(I16)),
            ("state_code", Text),
            ("state_name", Text),
            ("data_type_text", Text),
            ("industry_name", Text),
            ("series_id", Text),
            ("supersector_code", Text),
            ("industry_code", Text),
            ("period", Text),
            ("footnote_codes", Text),
            ("data_type_code", Text),
            ("seasonal", Text),
            ("begin_period", Text),
            ("end_period", Text),
            ("year", Integer(I16)),
            ("value", Float),
            ("begin_year", Integer(I16)),
            ("end_year", Integer(I16)),
        ]),
    }
}
