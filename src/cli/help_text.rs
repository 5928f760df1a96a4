pub(super) const ROOT_LONG_ABOUT: &str = "\
File integrity monitor for directory trees

Tamperwatch records the SHA-256 digest of every regular file under a directory in a
baseline, then tells you what changed: either on demand (verify) or live, while it
watches the tree (watch). Changes seen while watching are kept in an append-only event
log that can be rendered as an HTML report.

CORE CONCEPTS:

  Baseline:
    A JSON file mapping each file's path (relative to the watched directory, always
    with '/' separators) to its SHA-256 digest. Only regular files are tracked;
    directories, symlinks, sockets and other special files are never recorded.

  Events:
    Every change observed by 'watch' is recorded as ADDED, MODIFIED or DELETED with
    the old and new digest and a timestamp. Saving a file with identical content is
    not a change.

  Event log:
    A JSON file holding all events in the order they were observed. Each watch
    session appends its events to the existing log.

TYPICAL WORKFLOW:

  1. Record a baseline:
     $ tamperwatch init --path /srv/app --baseline app.baseline.json

  2. Check the tree against it at any time:
     $ tamperwatch verify --path /srv/app --baseline app.baseline.json

  3. Or watch it live (Ctrl-C to stop):
     $ tamperwatch watch --path /srv/app --baseline app.baseline.json \\
         --events app.events.json

  4. Render the event log:
     $ tamperwatch report --events app.events.json --out report.html

GLOBAL OPTIONS:

  -v, --verbose
    Increase log verbosity. -v shows progress, -vv shows per-file detail.

  --log-level <LEVEL>
    Set the log level explicitly. Cannot be combined with -v.

  Without either flag the RUST_LOG environment variable is honoured, and the
  default level is 'warn'. Logs go to stderr; results go to stdout.

EXIT CODES:

  0: Success (for verify: the tree matches the baseline)
  1: verify found integrity issues
  255: Any other error (missing directory, unreadable baseline, I/O errors, ...)

For detailed help on any command, use:
  tamperwatch <command> --help
";

pub(super) const INIT_LONG_ABOUT: &str = "\
Scan a directory and record its baseline

Walks the directory tree, computes the SHA-256 digest of every regular file and writes
the result to the baseline file. An existing baseline at that location is replaced.

USAGE:

  tamperwatch init --path <DIR> --baseline <FILE>

BEHAVIOR:

  - Symlinks are not followed and are not recorded
  - Special files (FIFOs, sockets, devices) are skipped
  - Files that cannot be read, or that change while being hashed, are left out
  - Unreadable subdirectories are skipped with a warning
  - Hashing runs on several threads; use --jobs to choose how many

The baseline is written atomically: a temporary file is written next to the target
and renamed into place, so an interrupted run never leaves a truncated baseline.

EXAMPLES:

  # Record a baseline for the current directory
  $ tamperwatch init --path . --baseline baseline.json

  # Use a single hashing thread on slow storage
  $ tamperwatch init --path /mnt/archive --baseline archive.json --jobs 1
";

pub(super) const VERIFY_LONG_ABOUT: &str = "\
Compare a directory against its baseline, exit with success if clean

Scans the directory exactly like 'init' and compares the result with the stored
baseline. Nothing is written.

USAGE:

  tamperwatch verify --path <DIR> --baseline <FILE>

OUTPUT:

Differences are printed to stdout, one line per path:

  M  <path>      content differs from the baseline
     sha256: <old>... -> <new>...
  R  <path>      in the baseline but no longer present
  A  <path>      present but not in the baseline

Modified entries are listed first, then missing, then extra; each group is sorted
by path.

EXIT CODES:

  0: All files match the baseline
  1: At least one modified, missing or extra file
  255: The directory or baseline could not be read

USE CASES:

**Cron jobs:**
  0 2 * * * tamperwatch verify --path /data --baseline /var/lib/data.json || alert_admin

**Deployment checks:**
  $ tamperwatch verify --path ./dist --baseline dist.json || exit 1
";

pub(super) const WATCH_LONG_ABOUT: &str = "\
Watch a directory and record changes until interrupted

Loads the baseline and keeps it up to date while watching the directory for changes.
Each content change is recorded as an event. Press Ctrl-C to end the session; the
updated baseline and the event log (existing events followed by this session's) are
then saved, and an HTML report is rendered.

USAGE:

  tamperwatch watch --path <DIR> --baseline <FILE> --events <FILE> [--report <FILE>]

BEHAVIOR:

  - A new file is recorded as ADDED
  - A file whose content changed is recorded as MODIFIED; re-saving identical
    content records nothing
  - A tracked file that disappears is recorded as DELETED
  - A rename is recorded as the deletion of the old path and the addition of the
    new one; moving a file out of the directory is a deletion, moving one in is
    an addition
  - Changes to directories, symlinks and special files are ignored

The report is written to report.html next to the event log unless --report is given.

The baseline must already exist; create it with 'tamperwatch init'.
";

pub(super) const REPORT_LONG_ABOUT: &str = "\
Render an HTML report from an event log

Writes a self-contained HTML page summarising the event log: counts per event type,
a bar chart, and a table of every event with shortened digests. The chart is drawn
with Chart.js, loaded from a CDN when the page is opened.

USAGE:

  tamperwatch report --events <FILE> --out <FILE>

The event log must exist. An empty log renders a page stating that no integrity
events were detected.
";
