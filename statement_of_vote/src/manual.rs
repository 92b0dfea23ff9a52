/*!

This is the long-form manual for `statement_of_vote` and `wineds`.

## Input formats

### The WinEDS export

The WinEDS Reporting Tool writes one line per contest, choice and precinct
(and per reporting type, see below). A line starts with a 16 character
numeric block:

```text
0AAACCCPPPPTTTTT
```

* `0` a literal zero
* `AAA` the contest id
* `CCC` the choice id
* `PPPP` the precinct id
* `TTTTT` the vote total

The vote total is always read from the same five columns. Some exports write a
placeholder such as `000-1` or `-1NON` there. Anything that is not a plain
number is read as 0 and logged.

Whatever follows, up to the first run of two or more spaces, is the party code
of the choice (`DEM`, `GRN`, ...). It may be glued to the numeric block.

The rest of the line is made of fields separated by runs of two or more
spaces:

1. the contest name
2. the choice name
3. the precinct name (`Pct 9902 MB` for a mail-ballot-only precinct)
4. the district of the contest, missing for the summary contests
5. the reporting type, only in "complete" exports: `TC-Election Day Reporting`
   or `TC-VBM Reporting`.

The columns are padded to a fixed width, so a district name that fills its
column runs straight into the reporting type:

```text
0010073990000000PF        US Representative, District 13   ...   13TH CONGRESSIONAL DISTRITC-Election Day Reporting
```

This is read as the district `13TH CONGRESSIONAL DISTRI` with the reporting
type `Election Day`.

Two summary contests carry precinct figures instead of votes:

| contest id | contest name                | meaning                           |
|------------|-----------------------------|-----------------------------------|
| 1          | `REGISTERED VOTERS - TOTAL` | registered voters of the precinct |
| 2          | `BALLOTS CAST - TOTAL`      | ballots cast in the precinct      |

A line is a summary line when its contest name is one of these names, or, for
lines without a district, when its contest id is one of these ids. Both the
names and the ids can be configured.

The choices named `Over Vote` and `Under Vote` are not candidates: they are
reported in their own columns.

The export must be grouped by contest. A contest that appears again after
another contest started is an error.
The two summary contests come first: a summary line after the first real
contest is an error too.

### The precinct index

A CSV file with one row per precinct:

```text
VotingPrecinctID,VotingPrecinctName,MailBallotPrecinct,BalType,Assembly,BART,Congressional,Neighborhood,Senatorial,Supervisorial
1101,Pct 1101,N,Consolidated,17,8,12,CVC CTR/DWTN,11,6
```

Each district type reads one column. Numbered district types turn the value
into a name with a format (`{}TH CONGRESSIONAL DISTRICT`). Neighborhoods use a
table from the label to the full name (`CVC CTR/DWTN` is `CIVIC CENTER/DOWNTOWN`).
A precinct listed twice is reported and the second row is ignored.

## Outputs

`wineds` writes `<output base>.tsv` and `<output base>.xlsx`.

For each contest, in the order of the export:

```text
*** Governor - CALIFORNIA (100)
Precinct Totals
PrecinctName  PrecinctID  Precincts  Registration  Ballots Cast  Turnout (%)  EDMUND G. BROWN  ...
Pct 1101      1101        1          484           141           29.13        17               ...
...
Grand Totals  City:0      ...

Governor - CALIFORNIA (100)
District and Neighborhood Totals
DistrictName                   DistrictLabel     Precincts  ...
12TH CONGRESSIONAL DISTRICT    Congressional:12  ...
...
CITY/COUNTY OF SAN FRANCISCO   City:0            ...
BAYVIEW/HUNTERS POINT          Neighborhood:BAYVW/HTRSPT ...
...
Grand Totals                   City:0            ...
```

Complete exports get a `ReportingType` column: each precinct has an
`Election Day` row and a `VBM` row, and the precinct report ends with one grand
total per reporting type before the combined one. Registration does not depend
on the reporting type, so turnout by reporting type is computed against the
full registration.

Turnout is `ballots cast / registration * 100`, rounded half up to two
decimals, and `0.00` when nobody is registered.

Precincts that the index does not place in a district are counted in an
`UNMAPPED PRECINCTS` district, so that every block of districts still adds up
to the grand total.

## Configuration

`wineds` comes with defaults for the San Francisco exports. A JSON file can
override them:

```json
{
  "outputSettings": {
    "electionName": "San Francisco June 3, 2014 Election",
    "outputBase": "out/june-2014"
  },
  "precinctFile": {
    "filePath": "precincts_20140321.csv",
    "idColumn": "VotingPrecinctID",
    "nameColumn": "VotingPrecinctName"
  },
  "exportFile": {
    "filePath": "wineds_export.txt",
    "overvoteLabel": "Over Vote",
    "undervoteLabel": "Under Vote"
  },
  "allowMissingMeta": false
}
```

Paths are relative to the directory of the configuration file. The command
line options take precedence over the file.

`districtTypes` (array, optional) replaces the list of district types. Each
entry has a `name` and either:
- `column` and `nameFormat`: a numbered district type,
- `column` and `names`: a table of labels to names,
- `jurisdiction`: a single district holding every precinct.

`formats` (in `outputSettings`, optional): any of `"tsv"` and `"xlsx"`. Both by
default.

`registrationContestId`, `registrationContestName`, `ballotsCastContestId`,
`ballotsCastContestName` (in `exportFile`, optional): how the two summary
contests are recognized. The names are checked first, the ids only apply to
lines without a district. Defaults: 1, `REGISTERED VOTERS - TOTAL`, 2,
`BALLOTS CAST - TOTAL`.

`allowMissingMeta` (bool, optional): a precinct without registration or ballots
cast normally stops the conversion. When set, the figures are taken as 0.

 */
