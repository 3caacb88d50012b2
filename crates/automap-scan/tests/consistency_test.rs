//! Cross-parser agreement over the fixture corpus

use automap_scan::{
    check_available, check_consistency, compare_maps, Capabilities, CheckOutcome, ParserFamily,
    ScanOptions, Scanner, SymbolKind,
};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn fixtures() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn write(root: &Path, name: &str, content: &str) {
    let path = root.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}

#[test]
fn test_reference_family_agrees_with_itself() {
    let report = check_consistency(
        &fixtures(),
        ParserFamily::DefinitionFinder,
        ParserFamily::DefinitionFinder,
        "",
    )
    .unwrap();
    assert!(report.is_consistent());
    assert_eq!(report.summary(), "consistent");
}

#[cfg(feature = "fact-scan")]
mod fact_scan {
    use super::*;
    use automap_scan::ScanError;

    /// Files where a text-level scan and a real parser are easy to tell apart
    fn tricky_tree() -> TempDir {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        write(root, "aliases.php", r#"<?hh
namespace Tricky;
/*
type Hidden = int;
*/
# newtype AlsoHidden = string;
$doc = <<<EOT
type InHeredoc = string;
EOT;
$raw = <<<'RAW'
  type InNowdoc = int;
  RAW;
function quoted(): string {
  return 'type InString = int;' . "newtype InDouble = int;";
}
type Real = int;
"#);
        write(root, "defines.php", r#"<?php
define('APP_' . 'DEBUG', true);
define(PREFIX . 'NAME', 1);
define('APP_ENV', 'prod');
\define("APP_MODE", 'cli');
if (!defined('LATER')) {
    define('LATER', 1);
}
"#);
        write(root, "generics.php", r#"<?hh
namespace Tricky;
class Box<T> extends Base<T> implements Boxed<T> {}
interface Mapper<Tin, Tout> {}
trait Holds<T> {}
enum Flag: int as int {
  ON = 1;
  OFF = 0;
}
enum Suit: string {
  case Hearts = 'H';
}
function identity<T as arraykey>(T $x): T { return $x; }
"#);
        write(root, "namespaces.php", "<?php\nnamespace /* legacy */ Old\\Name;\nclass Kept {}\nnamespace // trailing\nNewer;\nfunction moved() {}\n");
        write(root, "bin/tool.hack", "#!/usr/bin/env hhvm\nnamespace Tool;\nclass Headerless {}\nfunction main(): void {}\n");
        write(root, "lib/values.hck", "namespace Tool;\nconst LIMIT = 3;\ntype Id = int;\n");
        write(root, "ui/card.php", "<?hh\nclass :ui:card extends :x:element {}\n");
        dir
    }

    #[test]
    fn test_parsers_match_on_tricky_sources() {
        let dir = tricky_tree();
        let report = check_consistency(
            dir.path(),
            ParserFamily::DefinitionFinder,
            ParserFamily::FactScan,
            "",
        )
        .unwrap();
        assert!(report.is_consistent(), "{}: {:#?}", report.summary(), report.kinds);

        let map = Scanner::from_tree(dir.path(), ParserFamily::DefinitionFinder)
            .unwrap()
            .into_autoload_map();
        let keys = |kind: SymbolKind| -> Vec<String> { map.entries(kind).keys().cloned().collect() };

        assert_eq!(keys(SymbolKind::Type), vec!["Tool\\Id", "Tricky\\Real"]);
        assert_eq!(keys(SymbolKind::Constant), vec!["APP_ENV", "APP_MODE", "Tool\\LIMIT"]);
        assert_eq!(keys(SymbolKind::Function), vec![
            "Newer\\moved",
            "Tool\\main",
            "Tricky\\identity",
            "Tricky\\quoted",
        ]);
        assert_eq!(keys(SymbolKind::Class), vec![
            "old\\name\\kept",
            "tool\\headerless",
            "tricky\\box",
            "tricky\\flag",
            "tricky\\holds",
            "tricky\\mapper",
            "tricky\\suit",
            "xhp_ui__card",
        ]);
    }

    #[test]
    fn test_parsers_match() {
        let report = check_consistency(
            &fixtures(),
            ParserFamily::DefinitionFinder,
            ParserFamily::FactScan,
            "hh-only",
        )
        .unwrap();
        assert!(report.is_consistent(), "{:#?}", report.kinds);
        assert_eq!(report.kinds.len(), SymbolKind::ALL.len());
    }

    #[test]
    fn test_parsers_match_including_hack_fixtures() {
        let report = check_consistency(
            &fixtures(),
            ParserFamily::DefinitionFinder,
            ParserFamily::FactScan,
            "",
        )
        .unwrap();
        assert!(report.into_result().is_ok());
    }

    #[test]
    fn test_check_available_compares_both_families() {
        let outcome = check_available(
            &fixtures(),
            "hh-only",
            Capabilities::detect(),
            &ScanOptions::default(),
        )
        .unwrap();
        match outcome {
            CheckOutcome::Compared(report) => {
                assert_eq!(report.first, ParserFamily::DefinitionFinder);
                assert_eq!(report.second, ParserFamily::FactScan);
                assert!(report.is_consistent());
            }
            CheckOutcome::ReferenceOnly { reason, .. } => panic!("unexpected fallback: {reason}"),
        }
    }

    /// A file only one family accepts surfaces as a parse error, not a diff
    #[test]
    fn test_parse_failure_aborts_check() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.php"), "<?php\nclass A {}\n").unwrap();
        fs::write(dir.path().join("b.php"), "<?php\nclass B {\n").unwrap();

        let err = check_consistency(
            dir.path(),
            ParserFamily::DefinitionFinder,
            ParserFamily::FactScan,
            "",
        )
        .unwrap_err();
        assert!(matches!(err, ScanError::Parse(_)));
    }
}

#[test]
fn test_exclude_only_filters_matching_paths() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "app/app.php", "<?php\nfunction app() {}\n");
    write(dir.path(), "vendor/dep.php", "<?php\nfunction dep() {}\n");
    write(dir.path(), "lib/extra.php", "<?php\nclass Extra {}\n");

    // The whole tree against `app/` alone differs in vendor/ and lib/
    let whole = Scanner::from_tree(dir.path(), ParserFamily::DefinitionFinder)
        .unwrap()
        .into_autoload_map();
    let app_only = Scanner::from_tree(&dir.path().join("app"), ParserFamily::DefinitionFinder)
        .unwrap()
        .into_autoload_map();

    let kinds = compare_maps(&whole, &app_only, "");
    assert_eq!(kinds[1].kind, SymbolKind::Function);
    assert_eq!(kinds[1].only_in_first, vec!["dep"]);
    assert_eq!(kinds[0].only_in_first, vec!["extra"]);

    // Excluding vendor hides that difference and nothing else
    let kinds = compare_maps(&whole, &app_only, "vendor");
    assert!(kinds[1].is_empty(), "{:?}", kinds[1]);
    assert_eq!(kinds[0].only_in_first, vec!["extra"]);

    let report = check_consistency(
        dir.path(),
        ParserFamily::DefinitionFinder,
        ParserFamily::DefinitionFinder,
        "vendor",
    )
    .unwrap();
    assert!(report.is_consistent());
    assert_eq!(report.exclude, "vendor");
}

#[test]
fn test_reference_only_fallback() {
    let outcome = check_available(
        &fixtures().join("hh-only"),
        "",
        Capabilities::reference_only(),
        &ScanOptions::default(),
    )
    .unwrap();
    match outcome {
        CheckOutcome::ReferenceOnly { map, .. } => assert_eq!(map.len(), 8),
        CheckOutcome::Compared(_) => panic!("expected a reference-only outcome"),
    }
}
