/*!

This is the long-form manual for `vote_dumps` and `votedumps`.

## Input format

The command line tool reads one JSON file per contest, in the shape published by
the election night feeds:

```json
{"data": {"races": [{"state_name": "Georgia",
  "timeseries": [
    {"vote_shares": {}, "votes": 0, "timestamp": "2020-11-03T23:00:00Z"},
    {"vote_shares": {"bidenj": 0.601, "trumpd": 0.381}, "votes": 4131,
     "timestamp": "2020-11-04T00:03:07Z"}
  ]}]}}
```

Only the first race of a file is read. Vote shares are read as exact decimals from their
JSON text. The first element of the time series must be empty (no votes).

Each element of `timeseries` is a *snapshot*: a cumulative count at some point in time.
Its position in the list is its *index*, which is carried to every derived record.

## Reports

A report has one entry for each non-empty snapshot, compared with the previous non-empty
snapshot (or with the leading empty snapshot for the first entry). For each of the two
tracked candidates and for the third party (everyone else, key `other`) an entry gives
the vote share, the number of votes, the change in votes and the share of the new votes
that went to this candidate (`deltaVoteShare`, zero when no vote was added).

The third party numbers are always computed as the complement of the two candidates.
In particular, the third party `deltaVoteShare` is `1 - candidate1 - candidate2`, which
is `1` when no vote was added.

All the numbers are computed exactly and rounded to 3 decimal places in the report.

Reports can be sorted by decreasing value of one metric (`--sort-by`):

* `totalVotes`, `deltaVotes`, `deltaSeconds`
* `candidate1.<field>`, `candidate2.<field>`, `thirdParty.<field>` with `<field>` one of
  `voteShare`, `deltaVotes`, `deltaVoteShare`

## Annotations

With `--annotate`, every entry lists the counts that are negative or zero (for the
entry total and for each candidate), and the report lists the runs of consecutive
entries where a candidate got exactly the same `deltaVoteShare`.

## Lost votes

Between two consecutive non-empty snapshots, votes are counted as *lost* when the total
decreased, both candidates' votes decreased and both of their shares moved by more than
0.001. The amounts reported are the signed changes: they are negative.

## Vote swaps

Between two consecutive non-empty snapshots, a decrease of more than
`0.00049999 * total + 50` votes for one entity is matched against the simultaneous gains
of the other two entities, provided that the loss is not larger than the largest gain.
A losing candidate gives to the other candidate first, then to the third party.
A losing third party gives first to the candidate the analysis is biased against:
`votedumps swaps` prints the result for both choices.

These are fixed numerical rules. They flag patterns in the data, they do not establish
that anything wrong happened.

*/
